use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::{ApiResponse, BanDetails};
use crate::services::AuthError;

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ExternalApiError { service: String, message: String },

    ValidationError(String),

    InternalError(String),

    /// 401 with a reason code such as `missing_token` or `token_expired`.
    Unauthorized { code: &'static str, message: String },

    Forbidden(String),

    /// 400 login rejection that is not about the credentials themselves.
    LoginFailed { code: &'static str, message: String },

    Banned { reason: Option<String>, notice: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::ExternalApiError { service, message } => {
                write!(f, "{} error: {}", service, message)
            }
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Unauthorized { code, message } => {
                write!(f, "Unauthorized ({}): {}", code, message)
            }
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::LoginFailed { code, message } => {
                write!(f, "Login failed ({}): {}", code, message)
            }
            ApiError::Banned { .. } => write!(f, "Account is banned"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, error_message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "A database error occurred".to_string(),
                )
            }
            ApiError::ExternalApiError { service, message } => {
                tracing::warn!("{} API error: {}", service, message);
                (
                    StatusCode::BAD_GATEWAY,
                    "upstream_error",
                    format!("{} service is unavailable", service),
                )
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Unauthorized { code, message } => (StatusCode::UNAUTHORIZED, code, message),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg),
            ApiError::LoginFailed { code, message } => (StatusCode::BAD_REQUEST, code, message),
            ApiError::Banned { reason, notice } => {
                let body = ApiResponse::error_with(
                    "account_banned",
                    "Account is banned",
                    BanDetails {
                        ban_reason: reason,
                        ban_screen: notice,
                    },
                );
                return (StatusCode::FORBIDDEN, Json(body)).into_response();
            }
        };

        let body = ApiResponse::<()>::error(code, error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEncryption => ApiError::LoginFailed {
                code: "invalid_encryption",
                message: "Password could not be decrypted".to_string(),
            },
            AuthError::InvalidCredentials => ApiError::unauthorized(
                "invalid_credentials",
                "Invalid account or password",
            ),
            AuthError::Upstream(msg) | AuthError::UpstreamProtocol(msg) => {
                tracing::warn!("Provider login failed: {msg}");
                ApiError::login_failed()
            }
            AuthError::ProfileResolutionFailed => ApiError::login_failed(),
            AuthError::AccountBanned { reason, notice } => ApiError::Banned { reason, notice },
            AuthError::TokenExpired => {
                ApiError::unauthorized("token_expired", "Session has expired")
            }
            AuthError::TokenMalformed => {
                ApiError::unauthorized("token_malformed", "Session token is invalid")
            }
            AuthError::UserNotFound => {
                ApiError::unauthorized("user_not_found", "Session user no longer exists")
            }
            AuthError::NoStoredCredentials => {
                ApiError::validation("No stored provider credentials, log in again")
            }
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        ApiError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        ApiError::Forbidden(msg.into())
    }

    pub fn unauthorized(code: &'static str, msg: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            code,
            message: msg.into(),
        }
    }

    pub fn provider_error(msg: impl Into<String>) -> Self {
        ApiError::ExternalApiError {
            service: "Identity provider".to_string(),
            message: msg.into(),
        }
    }

    fn login_failed() -> Self {
        ApiError::LoginFailed {
            code: "login_failed",
            message: "Login failed, please try again later".to_string(),
        }
    }
}
