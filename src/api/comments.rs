use axum::{
    Extension, Json,
    extract::{Path, State},
    http::HeaderMap,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

use super::auth::{CurrentUser, viewer};
use super::posts::can_modify;
use super::validation::{validate_comment, validate_id};
use super::{
    ApiError, ApiResponse, AppState, CommentDto, LikeResponse, MessageResponse, UserSummary,
};
use crate::constants::notification_kind;
use crate::db::{CommentRow, NotificationTarget, User, now_timestamp};

#[derive(Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
    pub parent_id: Option<i32>,
}

async fn comment_dtos(
    state: &AppState,
    comments: Vec<CommentRow>,
    viewer: Option<&User>,
) -> Result<Vec<CommentDto>, ApiError> {
    let comment_ids: Vec<i32> = comments.iter().map(|c| c.id).collect();
    let mut author_ids: Vec<i32> = comments.iter().map(|c| c.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors = state.store().users().get_by_ids(&author_ids).await?;
    let liked = match viewer {
        Some(user) => {
            state
                .store()
                .comments()
                .liked_by(user.id, &comment_ids)
                .await?
        }
        None => HashSet::new(),
    };

    Ok(comments
        .into_iter()
        .map(|c| CommentDto {
            author: authors.get(&c.author_id).map(UserSummary::from),
            is_liked: liked.contains(&c.id),
            id: c.id,
            post_id: c.post_id,
            parent_id: c.parent_id,
            content: c.content,
            likes: c.likes,
            created_at: c.created_at,
        })
        .collect())
}

/// GET /posts/{id}/comments
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(post_id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<CommentDto>>>, ApiError> {
    let post_id = validate_id(post_id, "post")?;
    if state.store().posts().get(post_id).await?.is_none() {
        return Err(ApiError::not_found("Post", post_id));
    }

    let comments = state.store().comments().list_for_post(post_id).await?;
    let viewer = viewer(&state, &headers).await;
    let dtos = comment_dtos(&state, comments, viewer.as_ref()).await?;
    Ok(Json(ApiResponse::success(dtos)))
}

/// POST /posts/{id}/comments
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(post_id): Path<i32>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<ApiResponse<CommentDto>>, ApiError> {
    let content = validate_comment(&payload.content)?;
    let post = state
        .store()
        .posts()
        .get(validate_id(post_id, "post")?)
        .await?
        .ok_or_else(|| ApiError::not_found("Post", post_id))?;

    let parent = match payload.parent_id {
        Some(parent_id) => {
            let parent = state
                .store()
                .comments()
                .get(parent_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Comment", parent_id))?;
            if parent.post_id != post.id {
                return Err(ApiError::validation(
                    "Parent comment belongs to a different post",
                ));
            }
            Some(parent)
        }
        None => None,
    };

    let comment = state
        .store()
        .comments()
        .create(
            post.id,
            user.id,
            parent.as_ref().map(|p| p.id),
            content,
            &now_timestamp(),
        )
        .await?;

    let target = NotificationTarget {
        post_id: Some(post.id),
        comment_id: Some(comment.id),
        ..Default::default()
    };
    let notifier = state.notifier();
    match &parent {
        Some(parent) => {
            notifier
                .notify(parent.author_id, user.id, notification_kind::REPLY, target)
                .await;
        }
        None => {
            notifier
                .notify(post.author_id, user.id, notification_kind::COMMENT, target)
                .await;
        }
    }
    notifier
        .notify_mentions(content, user.id, post.author_id, target)
        .await;

    let dto = comment_dtos(&state, vec![comment], Some(&user))
        .await?
        .pop()
        .ok_or_else(|| ApiError::internal("Comment disappeared while building response"))?;
    Ok(Json(ApiResponse::success(dto)))
}

/// DELETE /posts/{post_id}/comments/{comment_id}
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path((post_id, comment_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let comment = state
        .store()
        .comments()
        .get(validate_id(comment_id, "comment")?)
        .await?
        .filter(|c| c.post_id == post_id && !c.is_deleted)
        .ok_or_else(|| ApiError::not_found("Comment", comment_id))?;

    if !can_modify(&user, comment.author_id) {
        return Err(ApiError::forbidden("Only the author can delete this comment"));
    }

    state.store().comments().soft_delete(comment.id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Comment deleted",
    ))))
}

/// POST /comments/{id}/like
pub async fn like_comment(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<LikeResponse>>, ApiError> {
    let comment = state
        .store()
        .comments()
        .get(validate_id(id, "comment")?)
        .await?
        .filter(|c| !c.is_deleted)
        .ok_or_else(|| ApiError::not_found("Comment", id))?;

    let (liked, likes) = state
        .store()
        .comments()
        .toggle_like(user.id, comment.id, &now_timestamp())
        .await?;

    Ok(Json(ApiResponse::success(LikeResponse { liked, likes })))
}
