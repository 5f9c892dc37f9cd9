use anyhow::{Context, Result};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set, sea_query::Expr,
};
use serde::Serialize;

use crate::constants::report::PENDING;
use crate::entities::{prelude::*, reports};

#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub id: i32,
    pub reporter_id: i32,
    pub target_type: String,
    pub target_id: String,
    pub reason: String,
    pub status: String,
    pub resolved_by: Option<i32>,
    pub created_at: String,
    pub resolved_at: Option<String>,
}

impl From<reports::Model> for ReportRow {
    fn from(m: reports::Model) -> Self {
        Self {
            id: m.id,
            reporter_id: m.reporter_id,
            target_type: m.target_type,
            target_id: m.target_id,
            reason: m.reason,
            status: m.status,
            resolved_by: m.resolved_by,
            created_at: m.created_at,
            resolved_at: m.resolved_at,
        }
    }
}

pub struct ReportRepository {
    conn: DatabaseConnection,
}

impl ReportRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn create(
        &self,
        reporter_id: i32,
        target_type: &str,
        target_id: &str,
        reason: &str,
        now: &str,
    ) -> Result<ReportRow> {
        let active_model = reports::ActiveModel {
            reporter_id: Set(reporter_id),
            target_type: Set(target_type.to_string()),
            target_id: Set(target_id.to_string()),
            reason: Set(reason.to_string()),
            status: Set(PENDING.to_string()),
            created_at: Set(now.to_string()),
            ..Default::default()
        };

        let model = Reports::insert(active_model)
            .exec_with_returning(&self.conn)
            .await
            .context("Failed to create report")?;

        Ok(ReportRow::from(model))
    }

    /// Newest first, optionally filtered by status.
    pub async fn list(&self, status: Option<&str>) -> Result<Vec<ReportRow>> {
        let mut query = Reports::find();
        if let Some(status) = status {
            query = query.filter(reports::Column::Status.eq(status));
        }

        let rows = query
            .order_by_desc(reports::Column::CreatedAt)
            .order_by_desc(reports::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list reports")?;

        Ok(rows.into_iter().map(ReportRow::from).collect())
    }

    pub async fn resolve(
        &self,
        id: i32,
        status: &str,
        resolved_by: i32,
        now: &str,
    ) -> Result<Option<ReportRow>> {
        Reports::update_many()
            .col_expr(reports::Column::Status, Expr::value(status.to_string()))
            .col_expr(reports::Column::ResolvedBy, Expr::value(resolved_by))
            .col_expr(reports::Column::ResolvedAt, Expr::value(now.to_string()))
            .filter(reports::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("Failed to resolve report")?;

        let row = Reports::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query report")?;

        Ok(row.map(ReportRow::from))
    }
}
