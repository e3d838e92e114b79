//! API error type and its HTTP mapping

use arithq_common::Error as CommonError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Request refers to something it may not access (403)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Error raised by the question store, parser or validator
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Common(err) => match err {
                CommonError::MalformedLine(_) => (StatusCode::BAD_REQUEST, "MALFORMED_QUESTION"),
                CommonError::ValidationFailed(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
                CommonError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
                CommonError::IdentityUnresolved => (StatusCode::BAD_REQUEST, "IDENTITY_UNRESOLVED"),
                CommonError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                CommonError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
                CommonError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR"),
                CommonError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
                CommonError::Config(_) | CommonError::Internal(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
        };

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let mut body = json!({
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        });

        if let ApiError::Common(CommonError::ValidationFailed(failure)) = &self {
            body["error"]["checks"] = json!(failure.checks());
        }

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
