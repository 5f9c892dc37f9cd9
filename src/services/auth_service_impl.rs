//! Credential bridge backed by the identity provider and the `SeaORM` store.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::{IdentityProvider, ProviderProfile, extract};
use crate::config::SecurityConfig;
use crate::constants::SITE_OWNER_ID;
use crate::crypto::{CredentialVault, KeyRing, SessionCodec};
use crate::db::{Store, User, UserProfileFields, now_timestamp};
use crate::services::auth_service::{AuthError, AuthService, LoginResult, UserProfile};
use crate::services::moderation;

#[derive(Clone)]
pub struct SeaOrmAuthService {
    store: Store,
    keys: Arc<KeyRing>,
    vault: CredentialVault,
    sessions: SessionCodec,
    provider: Arc<dyn IdentityProvider>,
    trust_token_payload: bool,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(
        store: Store,
        keys: Arc<KeyRing>,
        provider: Arc<dyn IdentityProvider>,
        security: &SecurityConfig,
    ) -> Self {
        let vault = keys.vault();
        let sessions = keys.session_codec(chrono::Duration::days(security.session_ttl_days));
        Self {
            store,
            keys,
            vault,
            sessions,
            provider,
            trust_token_payload: security.trust_unverified_token_payload,
        }
    }

    async fn banned(&self, user: &User) -> AuthError {
        let reason = user.ban_reason.clone();
        let notice = moderation::ban_notice(&self.store, reason.as_deref()).await;
        AuthError::AccountBanned { reason, notice }
    }

    /// Embedded user payload, then the token's own payload, then the
    /// profile endpoints.
    async fn resolve_identity(
        &self,
        response: &Value,
        provider_token: &str,
    ) -> Result<ProviderProfile, AuthError> {
        if let Some(profile) = extract::embedded_profile(response) {
            return Ok(profile);
        }

        if self.trust_token_payload
            && let Some(external_id) = extract::token_subject(provider_token)
        {
            let enriched = match self
                .provider
                .fetch_profile(provider_token, Some(&external_id))
                .await
            {
                Ok(Some(profile)) if profile.external_id == external_id => Some(profile),
                Ok(_) => None,
                Err(e) => {
                    warn!(%external_id, "Profile lookup failed: {e}");
                    None
                }
            };

            return Ok(enriched.unwrap_or(ProviderProfile {
                external_id,
                nickname: None,
                avatar_url: None,
                description: None,
            }));
        }

        match self.provider.fetch_profile(provider_token, None).await {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Err(AuthError::ProfileResolutionFailed),
            Err(e) => {
                warn!("Profile lookup failed: {e}");
                Err(AuthError::ProfileResolutionFailed)
            }
        }
    }

    async fn complete_login(
        &self,
        identity: &str,
        password: &str,
    ) -> Result<LoginResult, AuthError> {
        let response = self.provider.login(identity, password).await?;

        let provider_token = extract::extract_token(&response).ok_or_else(|| {
            AuthError::UpstreamProtocol("login response carries no token".to_string())
        })?;

        let profile = self.resolve_identity(&response, &provider_token).await?;

        let fields = UserProfileFields {
            display_name: profile
                .nickname
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("User {}", profile.external_id)),
            avatar_url: profile.avatar_url.filter(|a| !a.is_empty()),
            bio: profile.description.filter(|d| !d.is_empty()),
        };

        let (mut user, created) = self
            .store
            .users()
            .upsert_from_provider(&profile.external_id, &fields, &now_timestamp())
            .await?;

        if created && user.id == SITE_OWNER_ID && !user.is_admin {
            self.store.users().set_admin(user.id, true).await?;
            user.is_admin = true;
        }

        if user.is_banned {
            info!(user_id = user.id, "Rejected login for banned user");
            return Err(self.banned(&user).await);
        }

        let sealed = self
            .vault
            .seal(password)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        self.store
            .users()
            .store_credentials(user.id, identity, &sealed, &provider_token)
            .await?;

        let (token, expires_at) = self.sessions.issue(user.id)?;

        info!(
            user_id = user.id,
            external_id = %user.external_id,
            created,
            "User logged in"
        );

        Ok(LoginResult {
            token,
            expires_at,
            user: UserProfile::from(user),
        })
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    fn public_key_pem(&self) -> &str {
        self.keys.public_key_pem()
    }

    async fn authenticate(
        &self,
        identity: &str,
        encrypted_password: &str,
    ) -> Result<LoginResult, AuthError> {
        let result = match self.keys.decrypt_password(encrypted_password) {
            Ok(password) => {
                // Detached so a dropped request still finishes the provider
                // call and the user upsert.
                let this = self.clone();
                let identity = identity.to_string();
                tokio::spawn(async move { this.complete_login(&identity, &password).await })
                    .await
                    .map_err(|e| AuthError::Internal(format!("login task failed: {e}")))
                    .and_then(|r| r)
            }
            Err(_) => Err(AuthError::InvalidEncryption),
        };

        let outcome = result.as_ref().map_or_else(AuthError::outcome, |_| "success");
        metrics::counter!("auth_logins_total", "outcome" => outcome).increment(1);

        result
    }

    async fn validate(&self, token: &str) -> Result<User, AuthError> {
        let user_id = self.sessions.verify(token)?;

        let user = self
            .store
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if user.is_banned {
            return Err(self.banned(&user).await);
        }

        Ok(user)
    }

    async fn reauthenticate(&self, user_id: i32) -> Result<(), AuthError> {
        let credentials = self
            .store
            .users()
            .get_credentials(user_id)
            .await?
            .ok_or(AuthError::NoStoredCredentials)?;

        let password = self
            .vault
            .open(&credentials.encrypted_secret)
            .map_err(|e| AuthError::Internal(e.to_string()))?;

        let response = self
            .provider
            .login(&credentials.login_identity, &password)
            .await?;

        let provider_token = extract::extract_token(&response).ok_or_else(|| {
            AuthError::UpstreamProtocol("login response carries no token".to_string())
        })?;

        self.store
            .users()
            .set_provider_token(user_id, &provider_token)
            .await?;

        info!(user_id, "Provider session refreshed");
        Ok(())
    }
}
