//! API error responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cobrador_core::CobradorError;
use serde::Serialize;
use thiserror::Error;

/// Errors returned by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or wrong bearer secret.
    #[error("Missing or invalid bearer token")]
    Unauthorized,

    /// No recorded document has the requested id.
    #[error("Document {0} not found")]
    NotFound(String),

    /// Another pass is still running.
    #[error("A reconciliation pass is already running")]
    PassInProgress,

    /// The pass failed as a whole.
    #[error(transparent)]
    Pass(#[from] CobradorError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::PassInProgress => (StatusCode::CONFLICT, "pass_in_progress"),
            ApiError::Pass(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.kind()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        if let ApiError::Pass(e) = &self {
            tracing::error!(error = %e, kind = e.kind(), "Request failed");
        }

        let body = ErrorResponse {
            error: error_code.to_string(),
            message: self.to_string(),
            status: status.as_u16(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pass_errors_map_to_500() {
        let error = ApiError::from(CobradorError::Auth("INVALID_PASSWORD".into()));
        let (status, code) = error.status_and_code();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "auth_error");
    }

    #[test]
    fn test_unknown_document_maps_to_404() {
        let (status, code) = ApiError::NotFound("D9".into()).status_and_code();
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(code, "not_found");
    }

    #[test]
    fn test_unauthorized_maps_to_401() {
        let (status, code) = ApiError::Unauthorized.status_and_code();
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(code, "unauthorized");
    }
}
