use anyhow::{Context, Result};
use sea_orm::{DatabaseConnection, EntityTrait, Set, sea_query::OnConflict};

use crate::entities::{prelude::*, system_settings};

pub struct SettingsRepository {
    conn: DatabaseConnection,
}

impl SettingsRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = SystemSettings::find_by_id(key.to_string())
            .one(&self.conn)
            .await
            .context("Failed to query setting")?;

        Ok(row.map(|r| r.value))
    }

    pub async fn set(&self, key: &str, value: &str, now: &str) -> Result<()> {
        let active_model = system_settings::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(now.to_string()),
        };

        SystemSettings::insert(active_model)
            .on_conflict(
                OnConflict::column(system_settings::Column::Key)
                    .update_columns([
                        system_settings::Column::Value,
                        system_settings::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .with_context(|| format!("Failed to store setting {key}"))?;

        Ok(())
    }
}
