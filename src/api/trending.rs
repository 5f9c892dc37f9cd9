use axum::{Json, extract::State, http::HeaderMap};
use std::sync::Arc;

use super::auth::viewer;
use super::posts::post_dtos;
use super::works::work_dtos;
use super::{ApiError, ApiResponse, AppState, PostDto, WorkDto};

/// GET /trending/posts
pub async fn trending_posts(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Vec<PostDto>>>, ApiError> {
    let posts = state.trending().trending_posts(chrono::Utc::now()).await?;

    let viewer = viewer(&state, &headers).await;
    let dtos = post_dtos(&state, posts, viewer.as_ref()).await?;
    Ok(Json(ApiResponse::success(dtos)))
}

/// GET /trending/works
pub async fn trending_works(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Vec<WorkDto>>>, ApiError> {
    let works = state.trending().trending_works(chrono::Utc::now()).await?;

    let viewer = viewer(&state, &headers).await;
    let dtos = work_dtos(&state, works, viewer.as_ref()).await?;
    Ok(Json(ApiResponse::success(dtos)))
}
