use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

use super::auth::{CurrentUser, viewer};
use super::types::default_limit;
use super::validation::{validate_id, validate_post_content, validate_post_title};
use super::{
    ApiError, ApiResponse, AppState, LikeResponse, MessageResponse, PostDto, UserSummary,
};
use crate::constants::limits::MAX_PAGE_SIZE;
use crate::constants::notification_kind;
use crate::db::{NewPost, NotificationTarget, PostRow, User, now_timestamp};

#[derive(Deserialize)]
pub struct ListPostsQuery {
    #[serde(default)]
    pub skip: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    pub category_id: Option<i32>,
}

#[derive(Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    pub category_id: Option<i32>,
}

#[derive(Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category_id: Option<i32>,
}

#[derive(serde::Serialize)]
pub struct PinResponse {
    pub is_pinned: bool,
}

/// Authors and admins may change a piece of content.
pub(crate) const fn can_modify(user: &User, author_id: i32) -> bool {
    user.is_admin || user.id == author_id
}

/// Attaches authors and the viewer's like state.
pub(crate) async fn post_dtos(
    state: &AppState,
    posts: Vec<PostRow>,
    viewer: Option<&User>,
) -> Result<Vec<PostDto>, ApiError> {
    let post_ids: Vec<i32> = posts.iter().map(|p| p.id).collect();
    let mut author_ids: Vec<i32> = posts.iter().map(|p| p.author_id).collect();
    author_ids.sort_unstable();
    author_ids.dedup();

    let authors = state.store().users().get_by_ids(&author_ids).await?;
    let liked = match viewer {
        Some(user) => state.store().posts().liked_by(user.id, &post_ids).await?,
        None => HashSet::new(),
    };

    Ok(posts
        .into_iter()
        .map(|p| PostDto {
            author: authors.get(&p.author_id).map(UserSummary::from),
            is_liked: liked.contains(&p.id),
            id: p.id,
            title: p.title,
            content: p.content,
            category_id: p.category_id,
            likes: p.likes,
            views: p.views,
            is_pinned: p.is_pinned,
            created_at: p.created_at,
            updated_at: p.updated_at,
        })
        .collect())
}

async fn single_post_dto(
    state: &AppState,
    post: PostRow,
    viewer: Option<&User>,
) -> Result<PostDto, ApiError> {
    post_dtos(state, vec![post], viewer)
        .await?
        .pop()
        .ok_or_else(|| ApiError::internal("Post disappeared while building response"))
}

async fn load_post(state: &AppState, id: i32) -> Result<PostRow, ApiError> {
    state
        .store()
        .posts()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Post", id))
}

async fn check_category(state: &AppState, category_id: Option<i32>) -> Result<(), ApiError> {
    if let Some(category_id) = category_id
        && !state.store().categories().exists(category_id).await?
    {
        return Err(ApiError::not_found("Category", category_id));
    }
    Ok(())
}

/// GET /posts
pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ListPostsQuery>,
) -> Result<Json<ApiResponse<Vec<PostDto>>>, ApiError> {
    let limit = query.limit.clamp(1, MAX_PAGE_SIZE);
    let posts = state
        .store()
        .posts()
        .list(query.skip, limit, query.category_id)
        .await?;

    let viewer = viewer(&state, &headers).await;
    let dtos = post_dtos(&state, posts, viewer.as_ref()).await?;
    Ok(Json(ApiResponse::success(dtos)))
}

/// GET /posts/{id}
/// Counts as a view.
pub async fn get_post(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let id = validate_id(id, "post")?;
    state.store().posts().increment_views(id).await?;
    let post = load_post(&state, id).await?;

    let viewer = viewer(&state, &headers).await;
    let dto = single_post_dto(&state, post, viewer.as_ref()).await?;
    Ok(Json(ApiResponse::success(dto)))
}

/// POST /posts
pub async fn create_post(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let title = validate_post_title(&payload.title)?;
    let content = validate_post_content(&payload.content)?;
    check_category(&state, payload.category_id).await?;

    let new_post = NewPost {
        title: title.to_string(),
        content: content.to_string(),
        category_id: payload.category_id,
    };
    let post = state
        .store()
        .posts()
        .create(user.id, &new_post, &now_timestamp())
        .await?;

    tracing::info!(post_id = post.id, "Post created");

    let dto = single_post_dto(&state, post, Some(&user)).await?;
    Ok(Json(ApiResponse::success(dto)))
}

/// PUT /posts/{id}
pub async fn update_post(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<ApiResponse<PostDto>>, ApiError> {
    let post = load_post(&state, validate_id(id, "post")?).await?;
    if !can_modify(&user, post.author_id) {
        return Err(ApiError::forbidden("Only the author can edit this post"));
    }

    let title = payload.title.as_deref().map(validate_post_title).transpose()?;
    let content = payload
        .content
        .as_deref()
        .map(validate_post_content)
        .transpose()?;
    check_category(&state, payload.category_id).await?;

    let post = state
        .store()
        .posts()
        .update(id, title, content, payload.category_id, &now_timestamp())
        .await?
        .ok_or_else(|| ApiError::not_found("Post", id))?;

    let dto = single_post_dto(&state, post, Some(&user)).await?;
    Ok(Json(ApiResponse::success(dto)))
}

/// DELETE /posts/{id}
pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let post = load_post(&state, validate_id(id, "post")?).await?;
    if !can_modify(&user, post.author_id) {
        return Err(ApiError::forbidden("Only the author can delete this post"));
    }

    state.store().posts().delete(id).await?;
    tracing::info!(post_id = id, "Post deleted");

    Ok(Json(ApiResponse::success(MessageResponse::new("Post deleted"))))
}

/// PUT /posts/{id}/pin
pub async fn toggle_pin(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<PinResponse>>, ApiError> {
    let is_pinned = state
        .store()
        .posts()
        .toggle_pin(validate_id(id, "post")?)
        .await?
        .ok_or_else(|| ApiError::not_found("Post", id))?;

    Ok(Json(ApiResponse::success(PinResponse { is_pinned })))
}

/// POST /posts/{id}/like
pub async fn like_post(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<LikeResponse>>, ApiError> {
    let post = load_post(&state, validate_id(id, "post")?).await?;

    let (liked, likes) = state
        .store()
        .posts()
        .toggle_like(user.id, post.id, &now_timestamp())
        .await?;

    if liked {
        state
            .notifier()
            .notify(
                post.author_id,
                user.id,
                notification_kind::LIKE,
                NotificationTarget {
                    post_id: Some(post.id),
                    ..Default::default()
                },
            )
            .await;
    }

    Ok(Json(ApiResponse::success(LikeResponse { liked, likes })))
}
