use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session token has expired")]
    Expired,

    #[error("session token is malformed")]
    Malformed,

    #[error("failed to sign session token: {0}")]
    Signing(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Local user id.
    pub sub: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// Stateless HS256 session tokens.
#[derive(Clone)]
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl SessionCodec {
    #[must_use]
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Returns the signed token and its expiry as a unix timestamp.
    pub fn issue(&self, user_id: i32) -> Result<(String, i64), SessionError> {
        let now = Utc::now();
        let exp = (now + self.ttl).timestamp();

        let claims = SessionClaims {
            sub: user_id.to_string(),
            exp,
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| SessionError::Signing(e.to_string()))?;

        Ok((token, exp))
    }

    /// Checks signature and expiry, returning the local user id.
    pub fn verify(&self, token: &str) -> Result<i32, SessionError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Malformed,
            },
        )?;

        data.claims
            .sub
            .parse::<i32>()
            .map_err(|_| SessionError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_then_verify() {
        let codec = SessionCodec::new(b"test-secret", Duration::days(7));
        let (token, exp) = codec.issue(42).unwrap();
        assert_eq!(codec.verify(&token).unwrap(), 42);

        let expected = (Utc::now() + Duration::days(7)).timestamp();
        assert!((exp - expected).abs() <= 2);
    }

    #[test]
    fn test_tokens_are_unique_per_issue() {
        let codec = SessionCodec::new(b"test-secret", Duration::days(7));
        let (a, _) = codec.issue(1).unwrap();
        let (b, _) = codec.issue(1).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expired_token_reports_expired() {
        let codec = SessionCodec::new(b"test-secret", Duration::hours(-1));
        let (token, _) = codec.issue(7).unwrap();
        assert_eq!(codec.verify(&token), Err(SessionError::Expired));
    }

    #[test]
    fn test_wrong_secret_is_malformed() {
        let issuer = SessionCodec::new(b"secret-a", Duration::days(1));
        let verifier = SessionCodec::new(b"secret-b", Duration::days(1));
        let (token, _) = issuer.issue(7).unwrap();
        assert_eq!(verifier.verify(&token), Err(SessionError::Malformed));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let codec = SessionCodec::new(b"test-secret", Duration::days(1));
        assert_eq!(codec.verify("not.a.token"), Err(SessionError::Malformed));
        assert_eq!(codec.verify(""), Err(SessionError::Malformed));
    }
}
