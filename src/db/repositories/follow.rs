use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, sea_query::OnConflict,
};

use crate::entities::{follows, prelude::*};

pub struct FollowRepository {
    conn: DatabaseConnection,
}

impl FollowRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Returns true when a new edge was created.
    pub async fn follow(&self, follower_id: i32, followed_id: i32, now: &str) -> Result<bool> {
        let edge = follows::ActiveModel {
            follower_id: Set(follower_id),
            followed_id: Set(followed_id),
            created_at: Set(now.to_string()),
        };

        let inserted = Follows::insert(edge)
            .on_conflict(
                OnConflict::columns([follows::Column::FollowerId, follows::Column::FollowedId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to follow user")?;

        Ok(inserted > 0)
    }

    pub async fn unfollow(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        let result = Follows::delete_by_id((follower_id, followed_id))
            .exec(&self.conn)
            .await
            .context("Failed to unfollow user")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn is_following(&self, follower_id: i32, followed_id: i32) -> Result<bool> {
        Ok(Follows::find_by_id((follower_id, followed_id))
            .one(&self.conn)
            .await
            .context("Failed to query follow")?
            .is_some())
    }

    pub async fn followers_count(&self, user_id: i32) -> Result<u64> {
        Follows::find()
            .filter(follows::Column::FollowedId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count followers")
    }

    pub async fn following_count(&self, user_id: i32) -> Result<u64> {
        Follows::find()
            .filter(follows::Column::FollowerId.eq(user_id))
            .count(&self.conn)
            .await
            .context("Failed to count followed users")
    }

    /// Ids of users following `user_id`, most recent first.
    pub async fn follower_ids(&self, user_id: i32) -> Result<Vec<i32>> {
        Follows::find()
            .select_only()
            .column(follows::Column::FollowerId)
            .filter(follows::Column::FollowedId.eq(user_id))
            .order_by_desc(follows::Column::CreatedAt)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to list followers")
    }

    /// Ids of users that `user_id` follows, most recent first.
    pub async fn following_ids(&self, user_id: i32) -> Result<Vec<i32>> {
        Follows::find()
            .select_only()
            .column(follows::Column::FollowedId)
            .filter(follows::Column::FollowerId.eq(user_id))
            .order_by_desc(follows::Column::CreatedAt)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to list followed users")
    }
}
