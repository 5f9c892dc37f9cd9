use axum::{
    Extension, Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, MessageResponse};
use crate::db::User;
use crate::services::{LoginResult, UserProfile};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub identity: String,
    /// Base64 RSA ciphertext of the password.
    pub password: String,
}

#[derive(Serialize)]
pub struct PublicKeyResponse {
    pub public_key: String,
}

/// The authenticated caller, inserted by [`auth_middleware`].
#[derive(Clone)]
pub struct CurrentUser(pub User);

// ============================================================================
// Middleware
// ============================================================================

/// Requires `Authorization: Bearer <session token>`. Banned users and expired
/// or malformed tokens are rejected with distinct reason codes.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&headers)
        .ok_or_else(|| ApiError::unauthorized("missing_token", "Authentication required"))?;

    let user = state.auth_service().validate(token).await?;

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Runs after [`auth_middleware`].
pub async fn admin_middleware(request: Request, next: Next) -> Result<Response, ApiError> {
    let is_admin = request
        .extensions()
        .get::<CurrentUser>()
        .is_some_and(|CurrentUser(user)| user.is_admin);

    if !is_admin {
        return Err(ApiError::forbidden("Administrator access required"));
    }

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Caller on public routes. Any token problem just means anonymous.
pub async fn viewer(state: &AppState, headers: &HeaderMap) -> Option<User> {
    let token = bearer_token(headers)?;
    state.auth_service().validate(token).await.ok()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResult>>, ApiError> {
    let identity = payload.identity.trim();
    if identity.is_empty() {
        return Err(ApiError::validation("Account identity is required"));
    }
    if payload.password.trim().is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let result = state
        .auth_service()
        .authenticate(identity, &payload.password)
        .await?;

    Ok(Json(ApiResponse::success(result)))
}

/// GET /auth/public-key
pub async fn public_key(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<PublicKeyResponse>> {
    Json(ApiResponse::success(PublicKeyResponse {
        public_key: state.auth_service().public_key_pem().to_string(),
    }))
}

/// POST /auth/provider-session
/// Logs in at the provider again with the stored credentials.
pub async fn refresh_provider_session(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state.auth_service().reauthenticate(user.id).await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Provider session refreshed",
    ))))
}

/// GET /users/me
pub async fn me(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<ApiResponse<UserProfile>> {
    Json(ApiResponse::success(UserProfile::from(user)))
}
