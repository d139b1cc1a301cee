//! API error types and their HTTP mapping
//!
//! Domain errors from `ssp-common` are converted here into a stable HTTP
//! taxonomy the external UI can branch on:
//!
//! - Validation failures are 400 (fix the request, do not retry as-is)
//! - Phase and gate violations are 409 (re-read session state, try later)
//! - Unknown sessions are 404
//! - Store failures are 502 with a `retryable` flag (the trial is still
//!   current; a retryable failure may simply be submitted again)

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Request conflicts with session phase (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Minimum exposure not yet reached (409)
    #[error("Exposure gate not ready: {elapsed_ms}ms elapsed of {required_ms}ms required")]
    GateNotReady { elapsed_ms: i64, required_ms: i64 },

    /// External row store rejected or failed the append (502)
    #[error("Store append failed: {message}")]
    UpstreamStore { message: String, retryable: bool },

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ssp_common::Error> for ApiError {
    fn from(err: ssp_common::Error) -> Self {
        use ssp_common::Error;
        match err {
            Error::Validation(msg) => ApiError::BadRequest(msg),
            Error::GateNotReady {
                elapsed_ms,
                required_ms,
            } => ApiError::GateNotReady {
                elapsed_ms,
                required_ms,
            },
            Error::InvalidState(_) | Error::SessionComplete => ApiError::Conflict(err.to_string()),
            Error::StoreTransient(msg) => ApiError::UpstreamStore {
                message: msg,
                retryable: true,
            },
            Error::StorePermanent(msg) => ApiError::UpstreamStore {
                message: msg,
                retryable: false,
            },
            Error::Config(_) | Error::Io(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                json!({ "error": { "code": "NOT_FOUND", "message": msg } }),
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": { "code": "BAD_REQUEST", "message": msg } }),
            ),
            ApiError::Conflict(msg) => (
                StatusCode::CONFLICT,
                json!({ "error": { "code": "CONFLICT", "message": msg } }),
            ),
            ApiError::GateNotReady {
                elapsed_ms,
                required_ms,
            } => (
                StatusCode::CONFLICT,
                json!({
                    "error": {
                        "code": "GATE_NOT_READY",
                        "message": format!(
                            "minimum exposure not reached: {}ms elapsed of {}ms required",
                            elapsed_ms, required_ms
                        ),
                        "elapsed_ms": elapsed_ms,
                        "required_ms": required_ms,
                    }
                }),
            ),
            ApiError::UpstreamStore { message, retryable } => (
                StatusCode::BAD_GATEWAY,
                json!({
                    "error": {
                        "code": "STORE_UNAVAILABLE",
                        "message": message,
                        "retryable": retryable,
                    }
                }),
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": { "code": "INTERNAL_ERROR", "message": msg } }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
