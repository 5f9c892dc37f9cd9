use axum::{
    Extension, Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

use super::auth::{CurrentUser, viewer};
use super::comments::CreateCommentRequest;
use super::posts::can_modify;
use super::reports::file_report;
use super::validation::{validate_comment, validate_id, validate_report_reason};
use super::works::load_work;
use super::{
    ApiError, ApiResponse, AppState, LikeResponse, MessageResponse, UserSummary, WorkCommentDto,
};
use crate::constants::notification_kind;
use crate::db::{NotificationTarget, ReportRow, User, WorkCommentRow, WorkRow, now_timestamp};

#[derive(Deserialize)]
pub struct ReportCommentRequest {
    pub reason: String,
}

async fn work_comment_dtos(
    state: &AppState,
    work: &WorkRow,
    comments: Vec<WorkCommentRow>,
    viewer: Option<&User>,
) -> Result<Vec<WorkCommentDto>, ApiError> {
    let comment_ids: Vec<i32> = comments.iter().map(|c| c.id).collect();
    let mut author_ids: Vec<i32> = comments.iter().map(|c| c.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors = state.store().users().get_by_ids(&author_ids).await?;
    let liked = match viewer {
        Some(user) => {
            state
                .store()
                .work_comments()
                .liked_by(user.id, &comment_ids)
                .await?
        }
        None => HashSet::new(),
    };

    Ok(comments
        .into_iter()
        .map(|c| WorkCommentDto {
            author: authors.get(&c.author_id).map(UserSummary::from),
            is_liked: liked.contains(&c.id),
            id: c.id,
            work_id: work.work_id,
            parent_id: c.parent_id,
            content: c.content,
            likes: c.likes,
            created_at: c.created_at,
        })
        .collect())
}

async fn load_comment(state: &AppState, id: i32) -> Result<WorkCommentRow, ApiError> {
    state
        .store()
        .work_comments()
        .get(validate_id(id, "comment")?)
        .await?
        .filter(|c| !c.is_deleted)
        .ok_or_else(|| ApiError::not_found("Comment", id))
}

/// GET /works/{work_id}/comments
pub async fn list_work_comments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(work_id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<WorkCommentDto>>>, ApiError> {
    let work = load_work(&state, work_id).await?;

    let comments = state.store().work_comments().list_for_work(work.id).await?;
    let viewer = viewer(&state, &headers).await;
    let dtos = work_comment_dtos(&state, &work, comments, viewer.as_ref()).await?;
    Ok(Json(ApiResponse::success(dtos)))
}

/// POST /works/{work_id}/comments
/// Only works already mirrored locally can be commented on.
pub async fn create_work_comment(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(work_id): Path<i64>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<ApiResponse<WorkCommentDto>>, ApiError> {
    let content = validate_comment(&payload.content)?;
    let work = load_work(&state, work_id).await?;

    let parent = match payload.parent_id {
        Some(parent_id) => {
            let parent = state
                .store()
                .work_comments()
                .get(parent_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Comment", parent_id))?;
            if parent.work_id != work.id {
                return Err(ApiError::validation(
                    "Parent comment belongs to a different work",
                ));
            }
            Some(parent)
        }
        None => None,
    };

    let comment = state
        .store()
        .work_comments()
        .create(
            work.id,
            user.id,
            parent.as_ref().map(|p| p.id),
            content,
            &now_timestamp(),
        )
        .await?;

    let target = NotificationTarget {
        work_id: Some(work.id),
        comment_id: Some(comment.id),
        ..Default::default()
    };
    let (recipient, kind) = match &parent {
        Some(parent) => (parent.author_id, notification_kind::WORK_REPLY),
        None => (work.owner_id, notification_kind::WORK_COMMENT),
    };
    state.notifier().notify(recipient, user.id, kind, target).await;

    let dto = work_comment_dtos(&state, &work, vec![comment], Some(&user))
        .await?
        .pop()
        .ok_or_else(|| ApiError::internal("Comment disappeared while building response"))?;
    Ok(Json(ApiResponse::success(dto)))
}

/// DELETE /works/comments/{id}
pub async fn delete_work_comment(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let comment = load_comment(&state, id).await?;

    if !can_modify(&user, comment.author_id) {
        return Err(ApiError::forbidden("Only the author can delete this comment"));
    }

    state.store().work_comments().soft_delete(comment.id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Comment deleted",
    ))))
}

/// POST /works/comments/{id}/like
pub async fn like_work_comment(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<LikeResponse>>, ApiError> {
    let comment = load_comment(&state, id).await?;

    let (liked, likes) = state
        .store()
        .work_comments()
        .toggle_like(user.id, comment.id, &now_timestamp())
        .await?;

    Ok(Json(ApiResponse::success(LikeResponse { liked, likes })))
}

/// POST /works/comments/{id}/report
pub async fn report_work_comment(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<ReportCommentRequest>,
) -> Result<Json<ApiResponse<ReportRow>>, ApiError> {
    let reason = validate_report_reason(&payload.reason)?;
    let comment = load_comment(&state, id).await?;

    let report = file_report(
        &state,
        user.id,
        "work_comment",
        &comment.id.to_string(),
        reason,
    )
    .await?;
    Ok(Json(ApiResponse::success(report)))
}
