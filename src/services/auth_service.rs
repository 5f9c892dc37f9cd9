//! Domain service for the credential bridge and session validation.
//!
//! Login is delegated to the external identity provider; locally the service
//! only keeps the user record, an encrypted copy of the password and a signed
//! session token.

use serde::Serialize;
use thiserror::Error;

use crate::clients::ProviderError;
use crate::crypto::SessionError;
use crate::db::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Encrypted password could not be decrypted")]
    InvalidEncryption,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Identity provider error: {0}")]
    Upstream(String),

    #[error("Unexpected identity provider response: {0}")]
    UpstreamProtocol(String),

    #[error("Could not resolve the provider user id")]
    ProfileResolutionFailed,

    #[error("Account is banned")]
    AccountBanned {
        reason: Option<String>,
        notice: String,
    },

    #[error("Session token expired")]
    TokenExpired,

    #[error("Session token is malformed")]
    TokenMalformed,

    #[error("User not found")]
    UserNotFound,

    #[error("No stored provider credentials for this user")]
    NoStoredCredentials,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Label used for the `auth_logins_total` metric.
    #[must_use]
    pub const fn outcome(&self) -> &'static str {
        match self {
            Self::InvalidEncryption => "invalid_encryption",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Upstream(_) | Self::UpstreamProtocol(_) | Self::ProfileResolutionFailed => {
                "upstream_failure"
            }
            Self::AccountBanned { .. } => "banned",
            Self::TokenExpired | Self::TokenMalformed | Self::UserNotFound => "invalid_session",
            Self::NoStoredCredentials => "no_credentials",
            Self::Database(_) | Self::Internal(_) => "error",
        }
    }
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<ProviderError> for AuthError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::InvalidCredentials => Self::InvalidCredentials,
            ProviderError::Upstream(msg) => Self::Upstream(msg),
            ProviderError::Protocol(msg) => Self::UpstreamProtocol(msg),
        }
    }
}

impl From<SessionError> for AuthError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Expired => Self::TokenExpired,
            SessionError::Malformed => Self::TokenMalformed,
            SessionError::Signing(msg) => Self::Internal(msg),
        }
    }
}

/// Public view of a local user.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i32,
    pub external_id: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
    pub last_login_at: Option<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            external_id: user.external_id,
            display_name: user.display_name,
            avatar_url: user.avatar_url,
            bio: user.bio,
            is_admin: user.is_admin,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Session token and profile handed back after a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub token: String,
    /// Unix seconds.
    pub expires_at: i64,
    pub user: UserProfile,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// PEM-encoded public key clients encrypt passwords with.
    fn public_key_pem(&self) -> &str;

    /// Decrypts the password, logs in at the provider and issues a session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidEncryption`] before any provider call when
    /// the ciphertext is unusable, and [`AuthError::AccountBanned`] without a
    /// session when the resolved user is banned.
    async fn authenticate(
        &self,
        identity: &str,
        encrypted_password: &str,
    ) -> Result<LoginResult, AuthError>;

    /// Verifies a session token against the current user record.
    async fn validate(&self, token: &str) -> Result<User, AuthError>;

    /// Logs in at the provider again with the stored credentials and keeps
    /// the refreshed provider token.
    async fn reauthenticate(&self, user_id: i32) -> Result<(), AuthError>;
}
