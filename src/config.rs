use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub security: SecurityConfig,

    pub provider: ProviderConfig,

    pub trending: TrendingConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/forumbridge.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8000,
            cors_allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Directory holding generated key material.
    pub keys_dir: String,

    /// RSA private key, PKCS#8 PEM, relative to `keys_dir`.
    pub private_key_file: String,

    /// Base64 AES-256 key for stored provider passwords, relative to `keys_dir`.
    pub vault_key_file: String,

    /// Session secret file used when `session_secret` is unset.
    pub session_secret_file: String,

    /// HMAC secret for session tokens. Generated and persisted when absent.
    pub session_secret: Option<String>,

    pub session_ttl_days: i64,

    pub rsa_key_bits: usize,

    /// Accept the external id found in the provider token's payload without
    /// verifying its signature. Disabling forces a profile endpoint lookup.
    pub trust_unverified_token_payload: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            keys_dir: "data/keys".to_string(),
            private_key_file: "private_key.pem".to_string(),
            vault_key_file: "vault.key".to_string(),
            session_secret_file: "session.secret".to_string(),
            session_secret: None,
            session_ttl_days: 7,
            rsa_key_bits: 2048,
            trust_unverified_token_payload: true,
        }
    }
}

impl SecurityConfig {
    #[must_use]
    pub fn private_key_path(&self) -> PathBuf {
        Path::new(&self.keys_dir).join(&self.private_key_file)
    }

    #[must_use]
    pub fn vault_key_path(&self) -> PathBuf {
        Path::new(&self.keys_dir).join(&self.vault_key_file)
    }

    #[must_use]
    pub fn session_secret_path(&self) -> PathBuf {
        Path::new(&self.keys_dir).join(&self.session_secret_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,

    pub login_path: String,

    /// Profile endpoints tried in order until one yields a user id.
    pub profile_paths: Vec<String>,

    /// Work detail endpoint; `{id}` is replaced with the work id.
    pub work_path: String,

    pub client_pid: String,

    /// Request timeout in seconds (default: 15)
    pub request_timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.codemao.cn".to_string(),
            login_path: "/tiger/v3/web/accounts/login".to_string(),
            profile_paths: vec![
                "/web/users/details".to_string(),
                "/creation-tools/v1/user/center".to_string(),
            ],
            work_path: "/creation-tools/v1/works/{id}".to_string(),
            client_pid: "65edCTyg".to_string(),
            request_timeout_seconds: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendingConfig {
    pub post_window_days: i64,

    pub work_window_days: i64,

    pub min_results: usize,

    pub max_results: usize,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            post_window_days: 7,
            work_window_days: 30,
            min_results: 6,
            max_results: 12,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    /// Values from the process environment (or `.env`) win over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("FORUMBRIDGE_DATABASE_URL") {
            self.general.database_path = url;
        }
        if let Ok(secret) = std::env::var("FORUMBRIDGE_SESSION_SECRET") {
            self.security.session_secret = Some(secret);
        }
        if let Ok(url) = std::env::var("FORUMBRIDGE_PROVIDER_URL") {
            self.provider.base_url = url;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("forumbridge").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".forumbridge").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.provider.base_url.trim().is_empty() {
            anyhow::bail!("Provider base URL cannot be empty");
        }

        if self.provider.profile_paths.is_empty() {
            anyhow::bail!("At least one provider profile endpoint must be configured");
        }

        if self.security.session_ttl_days <= 0 {
            anyhow::bail!("Session TTL must be at least one day");
        }

        if self.security.rsa_key_bits < 1024 {
            anyhow::bail!("RSA key size must be at least 1024 bits");
        }

        if self.trending.min_results > self.trending.max_results {
            anyhow::bail!(
                "Trending min_results ({}) cannot exceed max_results ({})",
                self.trending.min_results,
                self.trending.max_results
            );
        }

        Ok(())
    }
}
