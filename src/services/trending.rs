use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::{Config, TrendingConfig};
use crate::constants::limits::FALLBACK_POOL_SIZE;
use crate::db::{PostRow, Store, WorkRow, timestamp};
use crate::ranking::{self, RankParams};

/// Pulls candidates from storage and hands them to the ranker.
pub struct TrendingService {
    store: Store,
    config: Arc<RwLock<Config>>,
}

impl TrendingService {
    #[must_use]
    pub const fn new(store: Store, config: Arc<RwLock<Config>>) -> Self {
        Self { store, config }
    }

    async fn settings(&self) -> TrendingConfig {
        self.config.read().await.trending.clone()
    }

    fn params(window_days: i64, settings: &TrendingConfig) -> RankParams {
        RankParams {
            window: Duration::days(window_days),
            min_results: settings.min_results,
            max_results: settings.max_results,
        }
    }

    pub async fn trending_posts(&self, now: DateTime<Utc>) -> Result<Vec<PostRow>> {
        let settings = self.settings().await;
        let params = Self::params(settings.post_window_days, &settings);
        let cutoff = timestamp(now - params.window);

        let posts = self.store.posts();
        let candidates = posts.created_since(&cutoff).await?;
        let pool = if candidates.len() < params.min_results {
            posts.top_by_engagement(FALLBACK_POOL_SIZE).await?
        } else {
            Vec::new()
        };

        debug!(
            candidates = candidates.len(),
            pool = pool.len(),
            "Ranking trending posts"
        );
        Ok(ranking::rank(candidates, pool, &params, now))
    }

    pub async fn trending_works(&self, now: DateTime<Utc>) -> Result<Vec<WorkRow>> {
        let settings = self.settings().await;
        let params = Self::params(settings.work_window_days, &settings);
        let cutoff = timestamp(now - params.window);

        let works = self.store.works();
        let candidates = works.created_since(&cutoff).await?;
        let pool = if candidates.len() < params.min_results {
            works.top_by_engagement(FALLBACK_POOL_SIZE).await?
        } else {
            Vec::new()
        };

        debug!(
            candidates = candidates.len(),
            pool = pool.len(),
            "Ranking trending works"
        );
        Ok(ranking::rank(candidates, pool, &params, now))
    }
}
