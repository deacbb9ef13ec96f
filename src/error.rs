//! Workflow error types with HTTP status code mapping.
//!
//! [`WorkflowError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2101,
///     "message": "request conflict: already matched",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges on [`WorkflowError`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                |
/// |-----------|-----------------|----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request            |
/// | 2000–2999 | State/Not Found | 404 / 409 / 403            |
/// | 3000–3999 | Server/Upstream | 500 / 502                  |
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Help request with the given ID was not found.
    #[error("help request not found: {0}")]
    RequestNotFound(uuid::Uuid),

    /// Helper offer with the given ID was not found.
    #[error("offer not found: {0}")]
    OfferNotFound(uuid::Uuid),

    /// The request is no longer in a state that permits the transition,
    /// typically because a concurrent accept claimed it first.
    #[error("request conflict: {0}")]
    RequestConflict(String),

    /// Caller is not allowed to perform the transition.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Store layer failure.
    #[error("store error: {0}")]
    Store(String),

    /// Assistant upstream call failed.
    #[error("assistant error: {0}")]
    Assistant(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl WorkflowError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::RequestNotFound(_) => 2001,
            Self::OfferNotFound(_) => 2002,
            Self::RequestConflict(_) => 2101,
            Self::Forbidden(_) => 2301,
            Self::Store(_) => 3001,
            Self::Assistant(_) => 3101,
            Self::Internal(_) => 3000,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::RequestNotFound(_) | Self::OfferNotFound(_) => StatusCode::NOT_FOUND,
            Self::RequestConflict(_) => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Assistant(_) => StatusCode::BAD_GATEWAY,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_409() {
        let err = WorkflowError::RequestConflict("already matched".to_string());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.error_code(), 2101);
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = WorkflowError::RequestNotFound(uuid::Uuid::new_v4());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn assistant_maps_to_502() {
        let err = WorkflowError::Assistant("timed out".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.error_code(), 3101);
    }

    #[test]
    fn display_includes_detail() {
        let err = WorkflowError::Store("connection refused".to_string());
        assert!(err.to_string().contains("connection refused"));
    }
}
