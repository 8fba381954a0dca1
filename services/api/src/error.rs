//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service, including the
//! mapping from errors to HTTP status codes and JSON error bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use tracing::error;

use crate::config::ConfigError;
use glasspanel_core::ports::PortError;

/// The primary error type for the `api` service.
///
/// Status mapping follows a fixed taxonomy: validation errors are 400,
/// missing credentials 401, rejected tokens 403, absent-or-not-owned
/// resources 404 (never distinguishing the two), and everything else a
/// generic 500 whose detail is logged server-side only.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from the persistence port.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A request missing or malforming a required field.
    #[error("{0}")]
    Validation(String),

    /// A request with no usable bearer token.
    #[error("{0}")]
    Unauthorized(String),

    /// A bearer token that failed signature or expiry verification.
    #[error("{0}")]
    Forbidden(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::Port(PortError::NotFound(_)) => {
                // Absent and not-owned are reported identically.
                (StatusCode::NOT_FOUND, "Not found".to_string())
            }
            ApiError::Port(PortError::AlreadyExists(_)) => {
                (StatusCode::CONFLICT, "Already exists".to_string())
            }
            ApiError::Port(PortError::Unauthorized) => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            other => {
                error!("Internal error: {:?}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_and_not_owned_share_a_status() {
        let resp = ApiError::Port(PortError::NotFound("session 9".into())).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let resp = ApiError::Validation("File name and content required".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn internal_detail_is_not_leaked() {
        let resp = ApiError::Internal("pool exhausted".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
