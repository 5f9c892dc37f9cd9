use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::category::Category;
pub use repositories::comment::CommentRow;
pub use repositories::notification::{NotificationRow, NotificationTarget};
pub use repositories::post::{NewPost, PostRow};
pub use repositories::report::ReportRow;
pub use repositories::user::{StoredCredentials, User, UserProfileFields};
pub use repositories::work::{WorkRow, WorkUpsert};
pub use repositories::work_comment::WorkCommentRow;

/// Timestamps are stored as fixed-width RFC 3339 UTC strings so that string
/// comparison matches chronological order.
#[must_use]
pub fn timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

#[must_use]
pub fn now_timestamp() -> String {
    timestamp(chrono::Utc::now())
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");
        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to `sqlite::memory:` is its own database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);
        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn users(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn categories(&self) -> repositories::category::CategoryRepository {
        repositories::category::CategoryRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn posts(&self) -> repositories::post::PostRepository {
        repositories::post::PostRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn comments(&self) -> repositories::comment::CommentRepository {
        repositories::comment::CommentRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn works(&self) -> repositories::work::WorkRepository {
        repositories::work::WorkRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn work_comments(&self) -> repositories::work_comment::WorkCommentRepository {
        repositories::work_comment::WorkCommentRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn follows(&self) -> repositories::follow::FollowRepository {
        repositories::follow::FollowRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn notifications(&self) -> repositories::notification::NotificationRepository {
        repositories::notification::NotificationRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn reports(&self) -> repositories::report::ReportRepository {
        repositories::report::ReportRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn settings(&self) -> repositories::settings::SettingsRepository {
        repositories::settings::SettingsRepository::new(self.conn.clone())
    }

    /// Grants admin to the site owner account if it exists.
    pub async fn ensure_owner_admin(&self) -> Result<bool> {
        self.users()
            .set_admin(crate::constants::SITE_OWNER_ID, true)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamps_sort_lexically() {
        let earlier = chrono::Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let later = earlier + chrono::Duration::milliseconds(1);
        assert!(timestamp(earlier) < timestamp(later));
        assert_eq!(timestamp(earlier), "2025-01-02T03:04:05.000000Z");
    }

    #[tokio::test]
    async fn test_in_memory_store_migrates_and_seeds() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        store.ping().await.unwrap();

        let categories = store.categories().list().await.unwrap();
        let slugs: Vec<_> = categories.iter().map(|c| c.slug.as_str()).collect();
        assert_eq!(slugs, vec!["general", "help", "showcase", "tutorials"]);
    }
}
