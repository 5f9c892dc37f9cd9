use axum::{Json, extract::State};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, CategoryDto};

/// GET /categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<CategoryDto>>>, ApiError> {
    let categories = state.store().categories().list().await?;

    let dtos = categories
        .into_iter()
        .map(|c| CategoryDto {
            id: c.id,
            name: c.name,
            slug: c.slug,
            description: c.description,
        })
        .collect();

    Ok(Json(ApiResponse::success(dtos)))
}
