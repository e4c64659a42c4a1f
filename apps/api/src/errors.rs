use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input rejected before any backend call. No state transition happens.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The action is not valid from the current workflow step, or another
    /// generation is still in flight.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether re-invoking the same entry point may succeed without new input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::Timeout { .. })
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::BackendUnavailable(msg) => {
                tracing::error!("Backend error: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "BACKEND_UNAVAILABLE",
                    msg.clone(),
                )
            }
            AppError::Timeout { seconds } => (
                StatusCode::GATEWAY_TIMEOUT,
                "TIMEOUT",
                format!("Search timed out after {seconds}s. The network might be slow."),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "retryable": self.is_retryable(),
            }
        }));

        (status, body).into_response()
    }
}
