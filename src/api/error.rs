//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::render::RenderError;
use crate::service::ServiceError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request body could not be read
    #[error("Validation error: {0}")]
    Validation(String),

    /// Figure could not be built from the current dataset
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Dataset load or refresh failed
    #[error("Refresh error: {0}")]
    Service(#[from] ServiceError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Render(RenderError::UnknownRegion(_)) => {
                (StatusCode::NOT_FOUND, "UNKNOWN_REGION")
            }
            ApiError::Render(_) => (StatusCode::INTERNAL_SERVER_ERROR, "RENDER_ERROR"),
            ApiError::Service(_) => (StatusCode::INTERNAL_SERVER_ERROR, "REFRESH_FAILED"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let request_id = uuid::Uuid::new_v4().to_string();

        tracing::error!(
            request_id = %request_id,
            error_code = %code,
            error_message = %self,
            "API error occurred"
        );

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prepare::PrepareError;

    #[test]
    fn test_status_codes() {
        let unknown = ApiError::Render(RenderError::UnknownRegion("2A".into()));
        assert_eq!(unknown.status_and_code().0, StatusCode::NOT_FOUND);

        let refresh = ApiError::Service(ServiceError::Prepare(PrepareError::UnknownRegion(
            "2A".into(),
        )));
        assert_eq!(
            refresh.status_and_code(),
            (StatusCode::INTERNAL_SERVER_ERROR, "REFRESH_FAILED")
        );
        assert!(refresh.to_string().contains("Unknown region code: 2A"));
    }

    #[test]
    fn test_error_response_shape() {
        let response = ApiError::Validation("bad".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
