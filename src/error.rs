// SPDX-License-Identifier: MIT

//! Application error types with consistent API responses.
//!
//! Permission and validation failures are local and non-retryable; they are
//! surfaced directly to the caller and never abort the process. Note that a
//! refresh token whose subject no longer exists maps to a validation error
//! (400), not a 404 - compatibility with the existing API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 401 with a `detail` message (missing credentials, failed login,
    /// unknown or inactive token subject).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Token is invalid or expired")]
    InvalidToken,

    /// 403 with the message preserved verbatim (blocked account,
    /// insufficient role or ownership).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// 400 with a field-keyed body: `{"<field>": "<message>"}`.
    #[error("Validation failed on {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Field-keyed validation error, rendered as `{"<field>": "<message>"}`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn detail(message: &str) -> Value {
    json!({ "detail": message })
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, detail(&msg)),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                detail("Token is invalid or expired"),
            ),
            AppError::PermissionDenied(msg) => (StatusCode::FORBIDDEN, detail(&msg)),
            AppError::Validation { field, message } => {
                let mut body = Map::new();
                body.insert(field, Value::String(message));
                (StatusCode::BAD_REQUEST, Value::Object(body))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, detail(&msg)),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    detail("A server error occurred."),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    detail("A server error occurred."),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_body_is_field_keyed() {
        let err = AppError::validation("error", "User does not exist");
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_permission_denied_is_403() {
        let err = AppError::PermissionDenied("nope".to_string());
        assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
    }
}
