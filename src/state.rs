use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::clients::{IdentityProvider, ProviderClient};
use crate::config::Config;
use crate::crypto::KeyRing;
use crate::db::Store;
use crate::services::{AuthService, Notifier, SeaOrmAuthService, TrendingService};

/// Build a shared HTTP client with reasonable defaults for API calls.
/// Reused by every provider call so connections are pooled.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("forumbridge/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

/// Loads or generates key material off the async runtime.
pub async fn load_key_ring(config: &Config) -> anyhow::Result<KeyRing> {
    let security = config.security.clone();
    tokio::task::spawn_blocking(move || KeyRing::load_or_generate(&security))
        .await
        .map_err(|e| anyhow::anyhow!("Key loading task failed: {e}"))?
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub keys: Arc<KeyRing>,

    pub provider: Arc<dyn IdentityProvider>,

    pub auth_service: Arc<dyn AuthService>,

    pub trending: Arc<TrendingService>,

    pub notifier: Notifier,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let keys = Arc::new(load_key_ring(&config).await?);

        let http_client = build_shared_http_client(config.provider.request_timeout_seconds)?;
        let provider = Arc::new(ProviderClient::with_shared_client(
            http_client,
            config.provider.clone(),
        )) as Arc<dyn IdentityProvider>;

        Self::with_components(config, keys, provider).await
    }

    /// Wires the state around caller-supplied key material and provider.
    pub async fn with_components(
        config: Config,
        keys: Arc<KeyRing>,
        provider: Arc<dyn IdentityProvider>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        if store.ensure_owner_admin().await? {
            info!("Site owner account has admin rights");
        }

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            keys.clone(),
            provider.clone(),
            &config.security,
        )) as Arc<dyn AuthService>;

        let config_arc = Arc::new(RwLock::new(config));

        let trending = Arc::new(TrendingService::new(store.clone(), config_arc.clone()));
        let notifier = Notifier::new(store.clone());

        Ok(Self {
            config: config_arc,
            store,
            keys,
            provider,
            auth_service,
            trending,
            notifier,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
