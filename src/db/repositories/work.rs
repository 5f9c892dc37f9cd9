use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use serde::Serialize;
use std::collections::HashSet;

use crate::entities::{prelude::*, work_likes, works};
use crate::ranking::Rankable;

#[derive(Debug, Clone, Serialize)]
pub struct WorkRow {
    pub id: i32,
    pub work_id: i64,
    pub owner_id: i32,
    pub name: String,
    pub cover_url: Option<String>,
    pub description: Option<String>,
    pub bcm_url: Option<String>,
    pub likes: i64,
    pub views: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<works::Model> for WorkRow {
    fn from(m: works::Model) -> Self {
        Self {
            id: m.id,
            work_id: m.work_id,
            owner_id: m.owner_id,
            name: m.name,
            cover_url: m.cover_url,
            description: m.description,
            bcm_url: m.bcm_url,
            likes: m.likes,
            views: m.views,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl Rankable for WorkRow {
    fn rank_id(&self) -> i64 {
        self.work_id
    }

    fn created_at(&self) -> &str {
        &self.created_at
    }

    fn like_count(&self) -> i64 {
        self.likes
    }

    fn view_count(&self) -> i64 {
        self.views
    }
}

/// Fields copied from the provider when a work is submitted.
#[derive(Debug, Clone)]
pub struct WorkUpsert {
    pub work_id: i64,
    pub name: String,
    pub cover_url: Option<String>,
    pub description: Option<String>,
    pub bcm_url: Option<String>,
    pub likes: i64,
    pub views: i64,
}

pub struct WorkRepository {
    conn: DatabaseConnection,
}

impl WorkRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Creates the mirror or refreshes it from the provider's numbers.
    pub async fn upsert(&self, owner_id: i32, work: &WorkUpsert, now: &str) -> Result<(WorkRow, bool)> {
        let existed = self.get_by_work_id(work.work_id).await?.is_some();

        let active_model = works::ActiveModel {
            work_id: Set(work.work_id),
            owner_id: Set(owner_id),
            name: Set(work.name.clone()),
            cover_url: Set(work.cover_url.clone()),
            description: Set(work.description.clone()),
            bcm_url: Set(work.bcm_url.clone()),
            likes: Set(work.likes),
            views: Set(work.views),
            created_at: Set(now.to_string()),
            updated_at: Set(now.to_string()),
            ..Default::default()
        };

        Works::insert(active_model)
            .on_conflict(
                OnConflict::column(works::Column::WorkId)
                    .update_columns([
                        works::Column::OwnerId,
                        works::Column::Name,
                        works::Column::CoverUrl,
                        works::Column::Description,
                        works::Column::BcmUrl,
                        works::Column::Likes,
                        works::Column::Views,
                        works::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to upsert work")?;

        let row = self
            .get_by_work_id(work.work_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Work {} vanished after upsert", work.work_id))?;

        Ok((row, !existed))
    }

    pub async fn get_by_work_id(&self, work_id: i64) -> Result<Option<WorkRow>> {
        let row = Works::find()
            .filter(works::Column::WorkId.eq(work_id))
            .one(&self.conn)
            .await
            .context("Failed to query work")?;

        Ok(row.map(WorkRow::from))
    }

    pub async fn list(&self, skip: u64, limit: u64) -> Result<Vec<WorkRow>> {
        let rows = Works::find()
            .order_by_desc(works::Column::CreatedAt)
            .offset(skip)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list works")?;

        Ok(rows.into_iter().map(WorkRow::from).collect())
    }

    pub async fn toggle_like(&self, user_id: i32, local_id: i32, now: &str) -> Result<(bool, i64)> {
        let txn = self.conn.begin().await?;

        let removed = WorkLikes::delete_many()
            .filter(work_likes::Column::UserId.eq(user_id))
            .filter(work_likes::Column::WorkId.eq(local_id))
            .exec(&txn)
            .await?
            .rows_affected
            > 0;

        if removed {
            Works::update_many()
                .col_expr(works::Column::Likes, Expr::col(works::Column::Likes).sub(1))
                .filter(works::Column::Id.eq(local_id))
                .filter(works::Column::Likes.gt(0))
                .exec(&txn)
                .await?;
        } else {
            let like = work_likes::ActiveModel {
                user_id: Set(user_id),
                work_id: Set(local_id),
                created_at: Set(now.to_string()),
            };
            let inserted = WorkLikes::insert(like)
                .on_conflict(
                    OnConflict::columns([work_likes::Column::UserId, work_likes::Column::WorkId])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;

            if inserted > 0 {
                Works::update_many()
                    .col_expr(works::Column::Likes, Expr::col(works::Column::Likes).add(1))
                    .filter(works::Column::Id.eq(local_id))
                    .exec(&txn)
                    .await?;
            }
        }

        let likes = Works::find_by_id(local_id)
            .one(&txn)
            .await?
            .map_or(0, |w| w.likes);

        txn.commit().await.context("Failed to toggle work like")?;

        Ok((!removed, likes))
    }

    /// Local work ids among `local_ids` that the user has liked.
    pub async fn liked_by(&self, user_id: i32, local_ids: &[i32]) -> Result<HashSet<i32>> {
        if local_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = WorkLikes::find()
            .select_only()
            .column(work_likes::Column::WorkId)
            .filter(work_likes::Column::UserId.eq(user_id))
            .filter(work_likes::Column::WorkId.is_in(local_ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query work likes")?;

        Ok(ids.into_iter().collect())
    }

    pub async fn created_since(&self, cutoff: &str) -> Result<Vec<WorkRow>> {
        let rows = Works::find()
            .filter(works::Column::CreatedAt.gte(cutoff))
            .order_by_desc(works::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query recent works")?;

        Ok(rows.into_iter().map(WorkRow::from).collect())
    }

    pub async fn top_by_engagement(&self, limit: u64) -> Result<Vec<WorkRow>> {
        let rows = Works::find()
            .order_by_desc(Expr::cust("likes * 2 + views"))
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query popular works")?;

        Ok(rows.into_iter().map(WorkRow::from).collect())
    }
}
