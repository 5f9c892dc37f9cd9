use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use serde::Serialize;
use std::collections::HashSet;

use crate::entities::{comment_likes, comments, post_likes, posts, prelude::*};
use crate::ranking::Rankable;

#[derive(Debug, Clone, Serialize)]
pub struct PostRow {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub author_id: i32,
    pub category_id: Option<i32>,
    pub likes: i64,
    pub views: i64,
    pub is_pinned: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<posts::Model> for PostRow {
    fn from(m: posts::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            content: m.content,
            author_id: m.author_id,
            category_id: m.category_id,
            likes: m.likes,
            views: m.views,
            is_pinned: m.is_pinned,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

impl Rankable for PostRow {
    fn rank_id(&self) -> i64 {
        i64::from(self.id)
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

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category_id: Option<i32>,
}

pub struct PostRepository {
    conn: DatabaseConnection,
}

impl PostRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Pinned posts first, then newest.
    pub async fn list(
        &self,
        skip: u64,
        limit: u64,
        category_id: Option<i32>,
    ) -> Result<Vec<PostRow>> {
        let mut query = Posts::find();
        if let Some(category_id) = category_id {
            query = query.filter(posts::Column::CategoryId.eq(category_id));
        }

        let rows = query
            .order_by_desc(posts::Column::IsPinned)
            .order_by_desc(posts::Column::CreatedAt)
            .offset(skip)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list posts")?;

        Ok(rows.into_iter().map(PostRow::from).collect())
    }

    pub async fn list_by_author(&self, author_id: i32, skip: u64, limit: u64) -> Result<Vec<PostRow>> {
        let rows = Posts::find()
            .filter(posts::Column::AuthorId.eq(author_id))
            .order_by_desc(posts::Column::CreatedAt)
            .offset(skip)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list posts by author")?;

        Ok(rows.into_iter().map(PostRow::from).collect())
    }

    pub async fn get(&self, id: i32) -> Result<Option<PostRow>> {
        let row = Posts::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query post")?;

        Ok(row.map(PostRow::from))
    }

    pub async fn create(&self, author_id: i32, post: &NewPost, now: &str) -> Result<PostRow> {
        let active_model = posts::ActiveModel {
            title: Set(post.title.clone()),
            content: Set(post.content.clone()),
            author_id: Set(author_id),
            category_id: Set(post.category_id),
            likes: Set(0),
            views: Set(0),
            is_pinned: Set(false),
            created_at: Set(now.to_string()),
            updated_at: Set(now.to_string()),
            ..Default::default()
        };

        let model = Posts::insert(active_model)
            .exec_with_returning(&self.conn)
            .await
            .context("Failed to create post")?;

        Ok(PostRow::from(model))
    }

    pub async fn update(
        &self,
        id: i32,
        title: Option<&str>,
        content: Option<&str>,
        category_id: Option<i32>,
        now: &str,
    ) -> Result<Option<PostRow>> {
        let mut update = Posts::update_many()
            .col_expr(posts::Column::UpdatedAt, Expr::value(now.to_string()));

        if let Some(title) = title {
            update = update.col_expr(posts::Column::Title, Expr::value(title.to_string()));
        }
        if let Some(content) = content {
            update = update.col_expr(posts::Column::Content, Expr::value(content.to_string()));
        }
        if let Some(category_id) = category_id {
            update = update.col_expr(posts::Column::CategoryId, Expr::value(category_id));
        }

        update
            .filter(posts::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to update post")?;

        self.get(id).await
    }

    /// Removes the post with its comments and likes.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        let comment_ids: Vec<i32> = Comments::find()
            .select_only()
            .column(comments::Column::Id)
            .filter(comments::Column::PostId.eq(id))
            .into_tuple()
            .all(&txn)
            .await?;

        if !comment_ids.is_empty() {
            CommentLikes::delete_many()
                .filter(comment_likes::Column::CommentId.is_in(comment_ids))
                .exec(&txn)
                .await?;
        }

        Comments::delete_many()
            .filter(comments::Column::PostId.eq(id))
            .exec(&txn)
            .await?;

        PostLikes::delete_many()
            .filter(post_likes::Column::PostId.eq(id))
            .exec(&txn)
            .await?;

        let result = Posts::delete_by_id(id).exec(&txn).await?;

        txn.commit().await.context("Failed to delete post")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn increment_views(&self, id: i32) -> Result<()> {
        Posts::update_many()
            .col_expr(posts::Column::Views, Expr::col(posts::Column::Views).add(1))
            .filter(posts::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to increment post views")?;
        Ok(())
    }

    /// Flips the pin flag and returns the new value.
    pub async fn toggle_pin(&self, id: i32) -> Result<Option<bool>> {
        let Some(post) = self.get(id).await? else {
            return Ok(None);
        };

        let pinned = !post.is_pinned;
        Posts::update_many()
            .col_expr(posts::Column::IsPinned, Expr::value(pinned))
            .filter(posts::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to toggle pin")?;

        Ok(Some(pinned))
    }

    /// Likes or unlikes the post. Returns the new state and like count.
    pub async fn toggle_like(&self, user_id: i32, post_id: i32, now: &str) -> Result<(bool, i64)> {
        let txn = self.conn.begin().await?;

        let removed = PostLikes::delete_many()
            .filter(post_likes::Column::UserId.eq(user_id))
            .filter(post_likes::Column::PostId.eq(post_id))
            .exec(&txn)
            .await?
            .rows_affected
            > 0;

        if removed {
            Posts::update_many()
                .col_expr(posts::Column::Likes, Expr::col(posts::Column::Likes).sub(1))
                .filter(posts::Column::Id.eq(post_id))
                .filter(posts::Column::Likes.gt(0))
                .exec(&txn)
                .await?;
        } else {
            let like = post_likes::ActiveModel {
                user_id: Set(user_id),
                post_id: Set(post_id),
                created_at: Set(now.to_string()),
            };
            let inserted = PostLikes::insert(like)
                .on_conflict(
                    OnConflict::columns([post_likes::Column::UserId, post_likes::Column::PostId])
                        .do_nothing()
                        .to_owned(),
                )
                .exec_without_returning(&txn)
                .await?;

            if inserted > 0 {
                Posts::update_many()
                    .col_expr(posts::Column::Likes, Expr::col(posts::Column::Likes).add(1))
                    .filter(posts::Column::Id.eq(post_id))
                    .exec(&txn)
                    .await?;
            }
        }

        let likes = Posts::find_by_id(post_id)
            .one(&txn)
            .await?
            .map_or(0, |p| p.likes);

        txn.commit().await.context("Failed to toggle post like")?;

        Ok((!removed, likes))
    }

    pub async fn liked_by(&self, user_id: i32, post_ids: &[i32]) -> Result<HashSet<i32>> {
        if post_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids: Vec<i32> = PostLikes::find()
            .select_only()
            .column(post_likes::Column::PostId)
            .filter(post_likes::Column::UserId.eq(user_id))
            .filter(post_likes::Column::PostId.is_in(post_ids.iter().copied()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query post likes")?;

        Ok(ids.into_iter().collect())
    }

    pub async fn created_since(&self, cutoff: &str) -> Result<Vec<PostRow>> {
        let rows = Posts::find()
            .filter(posts::Column::CreatedAt.gte(cutoff))
            .order_by_desc(posts::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("Failed to query recent posts")?;

        Ok(rows.into_iter().map(PostRow::from).collect())
    }

    /// All-time popularity by raw `likes * 2 + views`.
    pub async fn top_by_engagement(&self, limit: u64) -> Result<Vec<PostRow>> {
        let rows = Posts::find()
            .order_by_desc(Expr::cust("likes * 2 + views"))
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to query popular posts")?;

        Ok(rows.into_iter().map(PostRow::from).collect())
    }
}
