use axum::{
    Json, Router,
    extract::State,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::clients::IdentityProvider;
use crate::config::Config;
use crate::services::{AuthService, Notifier, TrendingService};
use crate::state::SharedState;

mod admin;
pub mod auth;
mod categories;
mod comments;
mod error;
mod notifications;
mod observability;
mod posts;
mod reports;
mod trending;
mod types;
mod users;
mod validation;
mod work_comments;
mod works;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn provider(&self) -> &Arc<dyn IdentityProvider> {
        &self.shared.provider
    }

    #[must_use]
    pub fn trending(&self) -> &Arc<TrendingService> {
        &self.shared.trending
    }

    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.shared.notifier
    }
}

pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> Result<Json<ApiResponse<HealthResponse>>, ApiError> {
    state.store().ping().await?;
    Ok(Json(ApiResponse::success(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.start_time.elapsed().as_secs(),
    })))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().read().await.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .merge(create_public_router())
        .merge(create_protected_router(state.clone()))
        .merge(create_admin_router(state.clone()))
        .route_layer(middleware::from_fn(observability::logging_middleware))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
}

fn create_public_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/auth/public-key", get(auth::public_key))
        .route("/categories", get(categories::list_categories))
        .route("/posts", get(posts::list_posts))
        .route("/posts/{id}", get(posts::get_post))
        .route("/posts/{id}/comments", get(comments::list_comments))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/followers", get(users::list_followers))
        .route("/users/{id}/following", get(users::list_following))
        .route("/users/{id}/posts", get(users::list_user_posts))
        .route("/works", get(works::list_works))
        .route("/works/{work_id}", get(works::get_work))
        .route(
            "/works/{work_id}/comments",
            get(work_comments::list_work_comments),
        )
        .route("/trending/posts", get(trending::trending_posts))
        .route("/trending/works", get(trending::trending_works))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/provider-session", post(auth::refresh_provider_session))
        .route("/users/me", get(auth::me))
        .route(
            "/users/{id}/follow",
            post(users::follow_user).delete(users::unfollow_user),
        )
        .route("/posts", post(posts::create_post))
        .route(
            "/posts/{id}",
            put(posts::update_post).delete(posts::delete_post),
        )
        .route("/posts/{id}/like", post(posts::like_post))
        .route("/posts/{id}/comments", post(comments::create_comment))
        .route(
            "/posts/{post_id}/comments/{comment_id}",
            delete(comments::delete_comment),
        )
        .route("/comments/{id}/like", post(comments::like_comment))
        .route("/works", post(works::submit_work))
        .route("/works/{work_id}/like", post(works::like_work))
        .route(
            "/works/{work_id}/comments",
            post(work_comments::create_work_comment),
        )
        .route(
            "/works/comments/{id}",
            delete(work_comments::delete_work_comment),
        )
        .route(
            "/works/comments/{id}/like",
            post(work_comments::like_work_comment),
        )
        .route(
            "/works/comments/{id}/report",
            post(work_comments::report_work_comment),
        )
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/read-all", post(notifications::mark_all_read))
        .route("/notifications/{id}/read", post(notifications::mark_read))
        .route("/reports", post(reports::create_report))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

fn create_admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/ban", post(admin::ban_user))
        .route("/admin/users/admin", post(admin::set_admin))
        .route("/posts/{id}/pin", put(posts::toggle_pin))
        .route("/admin/reports", get(admin::list_reports))
        .route("/admin/reports/{id}/resolve", post(admin::resolve_report))
        .route(
            "/admin/settings/ban-screen",
            get(admin::get_ban_screen).put(admin::update_ban_screen),
        )
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn(auth::admin_middleware))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
