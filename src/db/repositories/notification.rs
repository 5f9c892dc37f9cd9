use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    sea_query::Expr,
};
use serde::Serialize;

use crate::constants::limits::NOTIFICATION_PAGE;
use crate::entities::{notifications, prelude::*};

#[derive(Debug, Clone, Serialize)]
pub struct NotificationRow {
    pub id: i32,
    pub recipient_id: i32,
    pub sender_id: Option<i32>,
    pub kind: String,
    pub post_id: Option<i32>,
    pub comment_id: Option<i32>,
    pub work_id: Option<i32>,
    pub is_read: bool,
    pub created_at: String,
}

impl From<notifications::Model> for NotificationRow {
    fn from(m: notifications::Model) -> Self {
        Self {
            id: m.id,
            recipient_id: m.recipient_id,
            sender_id: m.sender_id,
            kind: m.kind,
            post_id: m.post_id,
            comment_id: m.comment_id,
            work_id: m.work_id,
            is_read: m.is_read,
            created_at: m.created_at,
        }
    }
}

/// What a notification points at. All fields optional.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationTarget {
    pub post_id: Option<i32>,
    pub comment_id: Option<i32>,
    pub work_id: Option<i32>,
}

pub struct NotificationRepository {
    conn: DatabaseConnection,
}

impl NotificationRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        recipient_id: i32,
        sender_id: Option<i32>,
        kind: &str,
        target: NotificationTarget,
        now: &str,
    ) -> Result<()> {
        let active_model = notifications::ActiveModel {
            recipient_id: Set(recipient_id),
            sender_id: Set(sender_id),
            kind: Set(kind.to_string()),
            post_id: Set(target.post_id),
            comment_id: Set(target.comment_id),
            work_id: Set(target.work_id),
            is_read: Set(false),
            created_at: Set(now.to_string()),
            ..Default::default()
        };

        Notifications::insert(active_model)
            .exec(&self.conn)
            .await
            .context("Failed to create notification")?;

        Ok(())
    }

    /// Latest notifications for the recipient.
    pub async fn list_for(&self, recipient_id: i32) -> Result<Vec<NotificationRow>> {
        let rows = Notifications::find()
            .filter(notifications::Column::RecipientId.eq(recipient_id))
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id)
            .limit(NOTIFICATION_PAGE)
            .all(&self.conn)
            .await
            .context("Failed to list notifications")?;

        Ok(rows.into_iter().map(NotificationRow::from).collect())
    }

    /// Only the recipient can mark a notification read.
    pub async fn mark_read(&self, id: i32, recipient_id: i32) -> Result<bool> {
        let result = Notifications::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::Id.eq(id))
            .filter(notifications::Column::RecipientId.eq(recipient_id))
            .exec(&self.conn)
            .await
            .context("Failed to mark notification read")?;

        Ok(result.rows_affected > 0)
    }

    pub async fn mark_all_read(&self, recipient_id: i32) -> Result<u64> {
        let result = Notifications::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::RecipientId.eq(recipient_id))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(&self.conn)
            .await
            .context("Failed to mark notifications read")?;

        Ok(result.rows_affected)
    }
}
