use axum::{
    Extension, Json,
    extract::State,
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::validation::{validate_report_reason, validate_report_target};
use super::{ApiError, ApiResponse, AppState};
use crate::clients::extract::id_to_string;
use crate::db::{ReportRow, now_timestamp};

#[derive(Deserialize)]
pub struct CreateReportRequest {
    pub target_type: String,
    /// Numeric or string id.
    pub target_id: Value,
    pub reason: String,
}

fn local_id(target_id: &str) -> Result<i32, ApiError> {
    target_id
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::validation(format!("Invalid target ID: {target_id}")))
}

/// Checks that local targets exist, then stores a pending report.
pub(crate) async fn file_report(
    state: &AppState,
    reporter_id: i32,
    target_type: &str,
    target_id: &str,
    reason: &str,
) -> Result<ReportRow, ApiError> {
    match target_type {
        "post" => {
            let id = local_id(target_id)?;
            if state.store().posts().get(id).await?.is_none() {
                return Err(ApiError::not_found("Post", id));
            }
        }
        "comment" => {
            let id = local_id(target_id)?;
            if state.store().comments().get(id).await?.is_none() {
                return Err(ApiError::not_found("Comment", id));
            }
        }
        "work_comment" => {
            let id = local_id(target_id)?;
            if state.store().work_comments().get(id).await?.is_none() {
                return Err(ApiError::not_found("Comment", id));
            }
        }
        "user" => {
            let id = local_id(target_id)?;
            if state.store().users().get_by_id(id).await?.is_none() {
                return Err(ApiError::not_found("User", id));
            }
        }
        _ => {}
    }

    let report = state
        .store()
        .reports()
        .create(reporter_id, target_type, target_id, reason, &now_timestamp())
        .await?;

    tracing::info!(report_id = report.id, target_type, "Report filed");

    Ok(report)
}

/// POST /reports
pub async fn create_report(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateReportRequest>,
) -> Result<Json<ApiResponse<ReportRow>>, ApiError> {
    let target_type = validate_report_target(payload.target_type.trim())?;
    let reason = validate_report_reason(&payload.reason)?;
    let target_id = id_to_string(&payload.target_id)
        .ok_or_else(|| ApiError::validation("Target ID is required"))?;

    let report = file_report(&state, user.id, target_type, &target_id, reason).await?;
    Ok(Json(ApiResponse::success(report)))
}
