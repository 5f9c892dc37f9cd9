use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::HeaderMap,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;

use super::auth::{CurrentUser, viewer};
use super::{ApiError, ApiResponse, AppState, LikeResponse, PageQuery, UserSummary, WorkDto};
use crate::constants::notification_kind;
use crate::db::{NotificationTarget, User, WorkRow, WorkUpsert, now_timestamp};

#[derive(Deserialize)]
pub struct SubmitWorkRequest {
    pub work_id: i64,
    pub bcm_url: Option<String>,
}

pub(crate) async fn work_dtos(
    state: &AppState,
    works: Vec<WorkRow>,
    viewer: Option<&User>,
) -> Result<Vec<WorkDto>, ApiError> {
    let local_ids: Vec<i32> = works.iter().map(|w| w.id).collect();
    let mut owner_ids: Vec<i32> = works.iter().map(|w| w.owner_id).collect();
    owner_ids.sort_unstable();
    owner_ids.dedup();

    let owners = state.store().users().get_by_ids(&owner_ids).await?;
    let liked = match viewer {
        Some(user) => state.store().works().liked_by(user.id, &local_ids).await?,
        None => HashSet::new(),
    };

    Ok(works
        .into_iter()
        .map(|w| WorkDto {
            owner: owners.get(&w.owner_id).map(UserSummary::from),
            is_liked: liked.contains(&w.id),
            id: w.id,
            work_id: w.work_id,
            name: w.name,
            cover_url: w.cover_url,
            description: w.description,
            bcm_url: w.bcm_url,
            likes: w.likes,
            views: w.views,
            created_at: w.created_at,
            updated_at: w.updated_at,
        })
        .collect())
}

pub(crate) async fn load_work(state: &AppState, work_id: i64) -> Result<WorkRow, ApiError> {
    state
        .store()
        .works()
        .get_by_work_id(work_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Work", work_id))
}

fn validate_bcm_url(raw: Option<&str>) -> Result<Option<String>, ApiError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };

    let parsed = url::Url::parse(raw)
        .map_err(|e| ApiError::validation(format!("Invalid project file URL: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::validation(
            "Project file URL must use http or https",
        ));
    }
    Ok(Some(parsed.to_string()))
}

/// POST /works
/// Mirrors a provider work owned by the caller.
pub async fn submit_work(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<SubmitWorkRequest>,
) -> Result<Json<ApiResponse<WorkDto>>, ApiError> {
    if payload.work_id <= 0 {
        return Err(ApiError::validation("Invalid work ID"));
    }
    let bcm_url = validate_bcm_url(payload.bcm_url.as_deref())?;

    let work = state
        .provider()
        .fetch_work(payload.work_id)
        .await
        .map_err(|e| ApiError::provider_error(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("Work", payload.work_id))?;

    if work.owner_id().as_deref() != Some(user.external_id.as_str()) {
        return Err(ApiError::forbidden("You can only submit your own works"));
    }

    let upsert = WorkUpsert {
        work_id: work.id,
        name: work.work_name,
        cover_url: work.preview.filter(|p| !p.is_empty()),
        description: work.description.filter(|d| !d.is_empty()),
        bcm_url,
        likes: work.praise_times.max(0),
        views: work.view_times.max(0),
    };

    let (row, created) = state
        .store()
        .works()
        .upsert(user.id, &upsert, &now_timestamp())
        .await?;

    tracing::info!(work_id = row.work_id, created, "Work mirrored");

    let dto = work_dtos(&state, vec![row], Some(&user))
        .await?
        .pop()
        .ok_or_else(|| ApiError::internal("Work disappeared while building response"))?;
    Ok(Json(ApiResponse::success(dto)))
}

/// GET /works
pub async fn list_works(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<WorkDto>>>, ApiError> {
    let works = state
        .store()
        .works()
        .list(page.skip, page.clamped_limit())
        .await?;

    let viewer = viewer(&state, &headers).await;
    let dtos = work_dtos(&state, works, viewer.as_ref()).await?;
    Ok(Json(ApiResponse::success(dtos)))
}

/// GET /works/{work_id}
pub async fn get_work(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(work_id): Path<i64>,
) -> Result<Json<ApiResponse<WorkDto>>, ApiError> {
    let work = load_work(&state, work_id).await?;

    let viewer = viewer(&state, &headers).await;
    let dto = work_dtos(&state, vec![work], viewer.as_ref())
        .await?
        .pop()
        .ok_or_else(|| ApiError::not_found("Work", work_id))?;
    Ok(Json(ApiResponse::success(dto)))
}

/// POST /works/{work_id}/like
pub async fn like_work(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(work_id): Path<i64>,
) -> Result<Json<ApiResponse<LikeResponse>>, ApiError> {
    let work = load_work(&state, work_id).await?;

    let (liked, likes) = state
        .store()
        .works()
        .toggle_like(user.id, work.id, &now_timestamp())
        .await?;

    if liked {
        state
            .notifier()
            .notify(
                work.owner_id,
                user.id,
                notification_kind::WORK_LIKE,
                NotificationTarget {
                    work_id: Some(work.id),
                    ..Default::default()
                },
            )
            .await;
    }

    Ok(Json(ApiResponse::success(LikeResponse { liked, likes })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_bcm_url() {
        assert_eq!(validate_bcm_url(None).unwrap(), None);
        assert_eq!(validate_bcm_url(Some("  ")).unwrap(), None);
        assert!(validate_bcm_url(Some("https://example.com/a.bcm")).unwrap().is_some());
        assert!(validate_bcm_url(Some("ftp://example.com/a.bcm")).is_err());
        assert!(validate_bcm_url(Some("not a url")).is_err());
    }
}
