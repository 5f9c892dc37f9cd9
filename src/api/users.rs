use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use std::sync::Arc;

use super::auth::{CurrentUser, viewer};
use super::posts::post_dtos;
use super::validation::validate_id;
use super::{
    ApiError, ApiResponse, AppState, FollowResponse, PageQuery, PostDto, UserDetailDto,
    UserSummary,
};
use crate::constants::notification_kind;
use crate::db::{NotificationTarget, User, now_timestamp};

async fn load_user(state: &AppState, id: i32) -> Result<User, ApiError> {
    state
        .store()
        .users()
        .get_by_id(validate_id(id, "user")?)
        .await?
        .ok_or_else(|| ApiError::not_found("User", id))
}

/// GET /users/{id}
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDetailDto>>, ApiError> {
    let user = load_user(&state, id).await?;
    let viewer = viewer(&state, &headers).await;

    let follows = state.store().follows();
    let is_following = async {
        match &viewer {
            Some(v) if v.id != user.id => follows.is_following(v.id, user.id).await,
            _ => Ok(false),
        }
    };
    let (followers_count, following_count, is_following) = futures::try_join!(
        follows.followers_count(user.id),
        follows.following_count(user.id),
        is_following,
    )?;

    Ok(Json(ApiResponse::success(UserDetailDto {
        id: user.id,
        external_id: user.external_id,
        display_name: user.display_name,
        avatar_url: user.avatar_url,
        bio: user.bio,
        is_admin: user.is_admin,
        created_at: user.created_at,
        followers_count,
        following_count,
        is_following,
    })))
}

/// POST /users/{id}/follow
pub async fn follow_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<FollowResponse>>, ApiError> {
    let target = load_user(&state, id).await?;
    if target.id == me.id {
        return Err(ApiError::validation("You cannot follow yourself"));
    }

    let created = state
        .store()
        .follows()
        .follow(me.id, target.id, &now_timestamp())
        .await?;

    if created {
        state
            .notifier()
            .notify(
                target.id,
                me.id,
                notification_kind::FOLLOW,
                NotificationTarget::default(),
            )
            .await;
    }

    Ok(Json(ApiResponse::success(FollowResponse { following: true })))
}

/// DELETE /users/{id}/follow
pub async fn unfollow_user(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<FollowResponse>>, ApiError> {
    let target = load_user(&state, id).await?;
    state.store().follows().unfollow(me.id, target.id).await?;

    Ok(Json(ApiResponse::success(FollowResponse { following: false })))
}

async fn summaries(state: &AppState, ids: Vec<i32>) -> Result<Vec<UserSummary>, ApiError> {
    let users = state.store().users().get_by_ids(&ids).await?;
    Ok(ids
        .iter()
        .filter_map(|id| users.get(id).map(UserSummary::from))
        .collect())
}

/// GET /users/{id}/followers
pub async fn list_followers(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>, ApiError> {
    let user = load_user(&state, id).await?;
    let ids = state.store().follows().follower_ids(user.id).await?;
    Ok(Json(ApiResponse::success(summaries(&state, ids).await?)))
}

/// GET /users/{id}/following
pub async fn list_following(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>, ApiError> {
    let user = load_user(&state, id).await?;
    let ids = state.store().follows().following_ids(user.id).await?;
    Ok(Json(ApiResponse::success(summaries(&state, ids).await?)))
}

/// GET /users/{id}/posts
pub async fn list_user_posts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i32>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<PostDto>>>, ApiError> {
    let user = load_user(&state, id).await?;
    let posts = state
        .store()
        .posts()
        .list_by_author(user.id, page.skip, page.clamped_limit())
        .await?;

    let viewer = viewer(&state, &headers).await;
    let dtos = post_dtos(&state, posts, viewer.as_ref()).await?;
    Ok(Json(ApiResponse::success(dtos)))
}
