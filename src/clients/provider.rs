use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::extract;
use crate::config::ProviderConfig;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider rejected the credentials")]
    InvalidCredentials,

    #[error("provider request failed: {0}")]
    Upstream(String),

    #[error("unexpected provider response: {0}")]
    Protocol(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderProfile {
    pub external_id: String,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderWork {
    pub id: i64,
    pub work_name: String,
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub praise_times: i64,
    #[serde(default)]
    pub view_times: i64,
    #[serde(default)]
    pub user_info: Option<Value>,
}

impl ProviderWork {
    /// External id of the account that owns the work.
    #[must_use]
    pub fn owner_id(&self) -> Option<String> {
        self.user_info
            .as_ref()
            .and_then(|u| u.get("id"))
            .and_then(extract::id_to_string)
    }
}

/// The external platform that owns real accounts and mirrored content.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Posts credentials to the login endpoint and returns the raw response.
    async fn login(&self, identity: &str, password: &str) -> Result<Value, ProviderError>;

    /// Tries the profile endpoints in order. A non-200 answer moves on to the
    /// next endpoint; `Ok(None)` means none produced a user id.
    async fn fetch_profile(
        &self,
        token: &str,
        known_id: Option<&str>,
    ) -> Result<Option<ProviderProfile>, ProviderError>;

    /// `Ok(None)` when the work does not exist.
    async fn fetch_work(&self, work_id: i64) -> Result<Option<ProviderWork>, ProviderError>;
}

#[derive(Clone)]
pub struct ProviderClient {
    client: Client,
    config: ProviderConfig,
}

impl ProviderClient {
    #[must_use]
    pub const fn with_shared_client(client: Client, config: ProviderConfig) -> Self {
        Self { client, config }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl IdentityProvider for ProviderClient {
    async fn login(&self, identity: &str, password: &str) -> Result<Value, ProviderError> {
        let url = self.url(&self.config.login_path);
        let payload = serde_json::json!({
            "identity": identity,
            "password": password,
            "pid": self.config.client_pid,
        });

        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status();
        debug!(status = status.as_u16(), "Provider login responded");

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ProviderError::InvalidCredentials);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream(format!(
                "login returned {status} - {body}"
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ProviderError::Protocol(format!("login body is not JSON: {e}")))
    }

    async fn fetch_profile(
        &self,
        token: &str,
        known_id: Option<&str>,
    ) -> Result<Option<ProviderProfile>, ProviderError> {
        for path in &self.config.profile_paths {
            let mut url = self.url(path);
            if let Some(id) = known_id {
                url = format!("{url}?id={}", urlencoding::encode(id));
            }

            let request = self
                .client
                .get(&url)
                .bearer_auth(token)
                .header(header::COOKIE, format!("authorization={token}"));

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Profile endpoint {} failed: {}", path, e);
                    continue;
                }
            };

            if response.status() != StatusCode::OK {
                debug!(status = response.status().as_u16(), "Profile endpoint {} skipped", path);
                continue;
            }

            match response.json::<Value>().await {
                Ok(body) => {
                    if let Some(profile) = extract::profile_from_object(&body) {
                        return Ok(Some(profile));
                    }
                    debug!("Profile endpoint {} returned no user id", path);
                }
                Err(e) => warn!("Profile endpoint {} returned invalid JSON: {}", path, e),
            }
        }

        Ok(None)
    }

    async fn fetch_work(&self, work_id: i64) -> Result<Option<ProviderWork>, ProviderError> {
        let path = self.config.work_path.replace("{id}", &work_id.to_string());
        let response = self.client.get(self.url(&path)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream(format!(
                "work lookup returned {status} - {body}"
            )));
        }

        let work = response
            .json::<ProviderWork>()
            .await
            .map_err(|e| ProviderError::Protocol(format!("work body: {e}")))?;

        Ok(Some(work))
    }
}
