use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use serde::Serialize;
use std::collections::HashSet;

use crate::constants::limits::COMMENT_TOMBSTONE;
use crate::entities::{comment_likes, comments, prelude::*};

#[derive(Debug, Clone, Serialize)]
pub struct CommentRow {
    pub id: i32,
    pub post_id: i32,
    pub author_id: i32,
    pub parent_id: Option<i32>,
    pub content: String,
    pub likes: i64,
    pub is_deleted: bool,
    pub created_at: String,
}

impl From<comments::Model> for CommentRow {
    fn from(m: comments::Model) -> Self {
        Self {
            id: m.id,
            post_id: m.post_id,
            author_id: m.author_id,
            parent_id: m.parent_id,
            content: m.content,
            likes: m.likes,
            is_deleted: m.is_deleted,
            created_at: m.created_at,
        }
    }
}

pub struct CommentRepository {
    conn: DatabaseConnection,
}

impl CommentRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Visible comments for a post, newest first.
    pub async fn list_for_post(&self, post_id: i32) -> Result<Vec<CommentRow>> {
        let rows = Comments::find()
            .filter(comments::Column::PostId.eq(post_id))
            .filter(comments::Column::IsDeleted.eq(false))
            .order_by_desc(comments::Column::CreatedAt)
            .order_by_desc(comments::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list comments")?;

        Ok(rows.into_iter().map(CommentRow::from).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<CommentRow>> {
        let row = Comments::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query comment")?;

        Ok(row.map(CommentRow::from))
    }

    pub async fn create(
        &self,
        post_id: i32,
        author_id: i32,
        parent_id: Option<i32>,
        content: &str,
        now: &str,
    ) -> Result<CommentRow> {
        let active_model = comments::ActiveModel {
            post_id: Set(post_id),
            author_id: Set(author_id),
            parent_id: Set(parent_id),
            content: Set(content.to_string()),
            likes: Set(0),
            is_deleted: Set(false),
            created_at: Set(now.to_string()),
            ..Default::default()
        };

        let model = Comments::insert(active_model)
            .exec_with_returning(&self.conn)
            .await
            .context("Failed to create comment")?;

        Ok(CommentRow::from(model))
    }

    /// Keeps the row so replies stay attached; the content becomes a tombstone.
    pub async fn soft_delete(&self, id: i32) -> Result<bool> {
        let result = Comments::update_many()
            .col_expr(comments::Column::IsDeleted, Expr::value(true))
            .col_expr(
                comments::Column::Content,
                Expr::value(COMMENT_TOMBSTONE.to_string()),
            )
            .filter(comments::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to delete comment")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn toggle_like(
        &self,
        user_id: i32,
        comment_id: i32,
        now: &str,
    ) -> Result<(bool, i64)> {
        let txn = self.conn.begin().await?;

        let removed = CommentLikes::delete_many()
            .filter(comment_likes::Column::UserId.eq(user_id))
            .filter(comment_likes::Column::CommentId.eq(comment_id))
            .exec(&txn)
            .await?
            .rows_affected
            > 0;

        if removed {
            Comments::update_many()
                .col_expr(
                    comments::Column::Likes,
                    Expr::col(comments::Column::Likes).sub(1),
                )
                .filter(comments::Column::Id.eq(comment_id))
                .filter(comments::Column::Likes.gt(0))
                .exec(&txn)
                .await?;
        } else {
            let like = comment_likes::ActiveModel {
                user_id: Set(user_id),
                comment_id: Set(comment_id),
                created_at: Set(now.to_string()),
            };
            let inserted = CommentLikes::insert(like)
                .on_conflict(
                    OnConflict::columns([
                        comment_likes::Column::UserId,
                        comment_likes::Column::CommentId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;

            if inserted > 0 {
                Comments::update_many()
                    .col_expr(
                        comments::Column::Likes,
                        Expr::col(comments::Column::Likes).add(1),
                    )
                    .filter(comments::Column::Id.eq(comment_id))
                    .exec(&txn)
                    .await?;
            }
        }

        let likes = Comments::find_by_id(comment_id)
            .one(&txn)
            .await?
            .map_or(0, |c| c.likes);

        txn.commit().await.context("Failed to toggle comment like")?;

        Ok((!removed, likes))
    }

    pub async fn liked_by(&self, user_id: i32, comment_ids: &[i32]) -> Result<HashSet<i32>> {
        if comment_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = CommentLikes::find()
            .select_only()
            .column(comment_likes::Column::CommentId)
            .filter(comment_likes::Column::UserId.eq(user_id))
            .filter(comment_likes::Column::CommentId.is_in(comment_ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query comment likes")?;

        Ok(ids.into_iter().collect())
    }
}
