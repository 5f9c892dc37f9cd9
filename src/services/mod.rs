pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult, UserProfile};
pub use auth_service_impl::SeaOrmAuthService;

pub mod moderation;

pub mod notifier;
pub use notifier::Notifier;

pub mod trending;
pub use trending::TrendingService;
