use anyhow::{Context, Result};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use serde::Serialize;

use crate::entities::{categories, prelude::*};

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
}

pub struct CategoryRepository {
    conn: DatabaseConnection,
}

impl CategoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_model(m: categories::Model) -> Category {
        Category {
            id: m.id,
            name: m.name,
            slug: m.slug,
            description: m.description,
        }
    }

    pub async fn list(&self) -> Result<Vec<Category>> {
        let rows = Categories::find()
            .order_by_asc(categories::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list categories")?;

        Ok(rows.into_iter().map(Self::map_model).collect())
    }

    pub async fn exists(&self, id: i32) -> Result<bool> {
        Ok(Categories::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query category")?
            .is_some())
    }
}
