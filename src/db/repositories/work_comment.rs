use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use serde::Serialize;
use std::collections::HashSet;

use crate::constants::limits::COMMENT_TOMBSTONE;
use crate::entities::{prelude::*, work_comment_likes, work_comments};

#[derive(Debug, Clone, Serialize)]
pub struct WorkCommentRow {
    pub id: i32,
    pub work_id: i32,
    pub author_id: i32,
    pub parent_id: Option<i32>,
    pub content: String,
    pub likes: i64,
    pub is_deleted: bool,
    pub created_at: String,
}

impl From<work_comments::Model> for WorkCommentRow {
    fn from(m: work_comments::Model) -> Self {
        Self {
            id: m.id,
            work_id: m.work_id,
            author_id: m.author_id,
            parent_id: m.parent_id,
            content: m.content,
            likes: m.likes,
            is_deleted: m.is_deleted,
            created_at: m.created_at,
        }
    }
}

/// Comment threads on mirrored works. `work_id` is the local `works.id`.
pub struct WorkCommentRepository {
    conn: DatabaseConnection,
}

impl WorkCommentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Visible comments for a work, newest first.
    pub async fn list_for_work(&self, work_id: i32) -> Result<Vec<WorkCommentRow>> {
        let rows = WorkComments::find()
            .filter(work_comments::Column::WorkId.eq(work_id))
            .filter(work_comments::Column::IsDeleted.eq(false))
            .order_by_desc(work_comments::Column::CreatedAt)
            .order_by_desc(work_comments::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list work comments")?;

        Ok(rows.into_iter().map(WorkCommentRow::from).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<WorkCommentRow>> {
        let row = WorkComments::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query work comment")?;

        Ok(row.map(WorkCommentRow::from))
    }

    pub async fn create(
        &self,
        work_id: i32,
        author_id: i32,
        parent_id: Option<i32>,
        content: &str,
        now: &str,
    ) -> Result<WorkCommentRow> {
        let active_model = work_comments::ActiveModel {
            work_id: Set(work_id),
            author_id: Set(author_id),
            parent_id: Set(parent_id),
            content: Set(content.to_string()),
            likes: Set(0),
            is_deleted: Set(false),
            created_at: Set(now.to_string()),
            ..Default::default()
        };

        let model = WorkComments::insert(active_model)
            .exec_with_returning(&self.conn)
            .await
            .context("Failed to create work comment")?;

        Ok(WorkCommentRow::from(model))
    }

    pub async fn soft_delete(&self, id: i32) -> Result<bool> {
        let result = WorkComments::update_many()
            .col_expr(work_comments::Column::IsDeleted, Expr::value(true))
            .col_expr(
                work_comments::Column::Content,
                Expr::value(COMMENT_TOMBSTONE.to_string()),
            )
            .filter(work_comments::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to delete work comment")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn toggle_like(
        &self,
        user_id: i32,
        comment_id: i32,
        now: &str,
    ) -> Result<(bool, i64)> {
        let txn = self.conn.begin().await?;

        let removed = WorkCommentLikes::delete_many()
            .filter(work_comment_likes::Column::UserId.eq(user_id))
            .filter(work_comment_likes::Column::CommentId.eq(comment_id))
            .exec(&txn)
            .await?
            .rows_affected
            > 0;

        if removed {
            WorkComments::update_many()
                .col_expr(
                    work_comments::Column::Likes,
                    Expr::col(work_comments::Column::Likes).sub(1),
                )
                .filter(work_comments::Column::Id.eq(comment_id))
                .filter(work_comments::Column::Likes.gt(0))
                .exec(&txn)
                .await?;
        } else {
            let like = work_comment_likes::ActiveModel {
                user_id: Set(user_id),
                comment_id: Set(comment_id),
                created_at: Set(now.to_string()),
            };
            let inserted = WorkCommentLikes::insert(like)
                .on_conflict(
                    OnConflict::columns([
                        work_comment_likes::Column::UserId,
                        work_comment_likes::Column::CommentId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;

            if inserted > 0 {
                WorkComments::update_many()
                    .col_expr(
                        work_comments::Column::Likes,
                        Expr::col(work_comments::Column::Likes).add(1),
                    )
                    .filter(work_comments::Column::Id.eq(comment_id))
                    .exec(&txn)
                    .await?;
            }
        }

        let likes = WorkComments::find_by_id(comment_id)
            .one(&txn)
            .await?
            .map_or(0, |c| c.likes);

        txn.commit().await.context("Failed to toggle work comment like")?;

        Ok((!removed, likes))
    }

    pub async fn liked_by(&self, user_id: i32, comment_ids: &[i32]) -> Result<HashSet<i32>> {
        if comment_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = WorkCommentLikes::find()
            .select_only()
            .column(work_comment_likes::Column::CommentId)
            .filter(work_comment_likes::Column::UserId.eq(user_id))
            .filter(work_comment_likes::Column::CommentId.is_in(comment_ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query work comment likes")?;

        Ok(ids.into_iter().collect())
    }
}
