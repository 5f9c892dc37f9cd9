use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::constants::SITE_OWNER_ID;
use crate::constants::limits::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::constants::report::{REJECTED, RESOLVED};
use crate::db::{ReportRow, User, now_timestamp};
use crate::services::moderation;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct UserListQuery {
    pub q: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Serialize)]
pub struct UserListResponse {
    pub users: Vec<User>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Deserialize)]
pub struct BanRequest {
    pub user_id: i32,
    pub reason: Option<String>,
    #[serde(default = "default_true")]
    pub is_banned: bool,
}

const fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
pub struct AdminFlagRequest {
    pub user_id: i32,
    pub is_admin: bool,
}

#[derive(Deserialize)]
pub struct ReportListQuery {
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct ResolveReportRequest {
    pub status: String,
}

#[derive(Serialize, Deserialize)]
pub struct BanScreenDto {
    pub html: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /admin/users
/// Users that have logged in through the bridge. `page` starts at 1.
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<UserListQuery>,
) -> Result<Json<ApiResponse<UserListResponse>>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let (users, total) = state
        .store()
        .users()
        .list_logged_in(query.q.as_deref(), page - 1, limit)
        .await?;

    Ok(Json(ApiResponse::success(UserListResponse {
        users,
        total,
        page,
        limit,
    })))
}

/// POST /admin/users/ban
pub async fn ban_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Json(payload): Json<BanRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if payload.user_id == admin.id {
        return Err(ApiError::validation("You cannot ban yourself"));
    }

    let reason = payload
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    let found = state
        .store()
        .users()
        .set_banned(payload.user_id, payload.is_banned, reason)
        .await?;
    if !found {
        return Err(ApiError::not_found("User", payload.user_id));
    }

    tracing::info!(
        target_user = payload.user_id,
        banned = payload.is_banned,
        "Ban state changed"
    );

    let message = if payload.is_banned {
        "User banned"
    } else {
        "User unbanned"
    };
    Ok(Json(ApiResponse::success(MessageResponse::new(message))))
}

/// POST /admin/users/admin
/// Only the site owner can grant or revoke admin rights.
pub async fn set_admin(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Json(payload): Json<AdminFlagRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if admin.id != SITE_OWNER_ID {
        return Err(ApiError::forbidden(
            "Only the site owner can change admin rights",
        ));
    }
    if payload.user_id == admin.id {
        return Err(ApiError::validation("You cannot change your own admin rights"));
    }

    let found = state
        .store()
        .users()
        .set_admin(payload.user_id, payload.is_admin)
        .await?;
    if !found {
        return Err(ApiError::not_found("User", payload.user_id));
    }

    tracing::info!(
        target_user = payload.user_id,
        is_admin = payload.is_admin,
        "Admin flag changed"
    );

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Admin rights updated",
    ))))
}

/// GET /admin/reports
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportListQuery>,
) -> Result<Json<ApiResponse<Vec<ReportRow>>>, ApiError> {
    let status = query.status.as_deref().filter(|s| !s.is_empty());
    let reports = state.store().reports().list(status).await?;
    Ok(Json(ApiResponse::success(reports)))
}

/// POST /admin/reports/{id}/resolve
pub async fn resolve_report(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<ResolveReportRequest>,
) -> Result<Json<ApiResponse<ReportRow>>, ApiError> {
    let status = payload.status.trim();
    if status != RESOLVED && status != REJECTED {
        return Err(ApiError::validation(format!(
            "Status must be '{RESOLVED}' or '{REJECTED}'"
        )));
    }

    let report = state
        .store()
        .reports()
        .resolve(id, status, admin.id, &now_timestamp())
        .await?
        .ok_or_else(|| ApiError::not_found("Report", id))?;

    Ok(Json(ApiResponse::success(report)))
}

/// GET /admin/settings/ban-screen
pub async fn get_ban_screen(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<BanScreenDto>>, ApiError> {
    let html = moderation::ban_screen_template(state.store()).await?;
    Ok(Json(ApiResponse::success(BanScreenDto { html })))
}

/// PUT /admin/settings/ban-screen
pub async fn update_ban_screen(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BanScreenDto>,
) -> Result<Json<ApiResponse<BanScreenDto>>, ApiError> {
    if payload.html.trim().is_empty() {
        return Err(ApiError::validation("Ban screen cannot be empty"));
    }

    moderation::set_ban_screen_template(state.store(), &payload.html).await?;
    Ok(Json(ApiResponse::success(payload)))
}
