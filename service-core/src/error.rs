use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Transport-level error taxonomy.
///
/// Input errors map to 4xx and are safe to expose verbatim. Dependency
/// errors map to 5xx; their detail is logged, never returned.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Forbidden: {0}")]
    Forbidden(anyhow::Error),

    #[error("Internal server error: {0}")]
    InternalError(#[from] anyhow::Error),

    #[error("Store error: {0}")]
    StoreError(anyhow::Error),

    #[error("Delivery error: {0}")]
    DeliveryError(String),

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<mongodb::error::Error> for AppError {
    fn from(err: mongodb::error::Error) -> Self {
        AppError::StoreError(anyhow::Error::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            error: &'static str,
            message: String,
        }

        let (status, tag, message) = match self {
            AppError::ValidationError(err) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                err.to_string(),
            ),
            AppError::BadRequest(err) => {
                (StatusCode::BAD_REQUEST, "bad_request", err.to_string())
            }
            AppError::NotFound(err) => (StatusCode::NOT_FOUND, "not_found", err.to_string()),
            AppError::Unauthorized(err) => {
                (StatusCode::UNAUTHORIZED, "unauthorized", err.to_string())
            }
            AppError::Forbidden(err) => (StatusCode::FORBIDDEN, "forbidden", err.to_string()),
            AppError::InternalError(err) => {
                tracing::error!(error = ?err, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
            AppError::StoreError(err) => {
                tracing::error!(error = ?err, "Store error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "store_error",
                    "Storage unavailable".to_string(),
                )
            }
            AppError::DeliveryError(msg) => {
                tracing::error!(error = %msg, "Delivery error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "delivery_error",
                    "Message delivery failed".to_string(),
                )
            }
            AppError::InvalidToken(err) => {
                (StatusCode::UNAUTHORIZED, "invalid_token", err.to_string())
            }
            AppError::ConfigError(err) => {
                tracing::error!(error = ?err, "Configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "config_error",
                    "Service misconfigured".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error: tag,
                message,
            }),
        )
            .into_response()
    }
}
