use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::Serialize;
use std::sync::Arc;

use super::auth::CurrentUser;
use super::{ApiError, ApiResponse, AppState, MessageResponse, NotificationDto, UserSummary};

#[derive(Serialize)]
pub struct ReadAllResponse {
    pub updated: u64,
}

/// GET /notifications
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<Vec<NotificationDto>>>, ApiError> {
    let rows = state.store().notifications().list_for(user.id).await?;

    let mut sender_ids: Vec<i32> = rows.iter().filter_map(|n| n.sender_id).collect();
    sender_ids.sort_unstable();
    sender_ids.dedup();
    let senders = state.store().users().get_by_ids(&sender_ids).await?;

    let dtos = rows
        .into_iter()
        .map(|n| NotificationDto {
            sender: n
                .sender_id
                .and_then(|id| senders.get(&id))
                .map(UserSummary::from),
            id: n.id,
            kind: n.kind,
            post_id: n.post_id,
            comment_id: n.comment_id,
            work_id: n.work_id,
            is_read: n.is_read,
            created_at: n.created_at,
        })
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}

/// POST /notifications/{id}/read
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if !state.store().notifications().mark_read(id, user.id).await? {
        return Err(ApiError::not_found("Notification", id));
    }

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Notification marked as read",
    ))))
}

/// POST /notifications/read-all
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<ReadAllResponse>>, ApiError> {
    let updated = state.store().notifications().mark_all_read(user.id).await?;
    Ok(Json(ApiResponse::success(ReadAllResponse { updated })))
}
