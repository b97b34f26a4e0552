//! # API Error Types
//!
//! Structured error type for the `/v1/*` routes. Maps journal, pinning and
//! validation errors to HTTP status codes with a JSON body carrying a
//! machine-readable code. Internal and upstream details are logged, not
//! returned.
//!
//! `POST /upload` does not use this type: it keeps its plain-text contract.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use baseroot_pinning::PinningError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::journal::JournalError;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND").
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// A path or query value failed validation (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal server error (500). Message is logged but not returned.
    #[error("internal error: {0}")]
    Internal(String),

    /// The pinning service failed or is unreachable (502).
    #[error("upstream error: {0}")]
    UpstreamError(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::UpstreamError(_) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            Self::UpstreamError(_) => "An upstream service error occurred".to_string(),
            other => other.to_string(),
        };

        match &self {
            Self::Internal(_) => tracing::error!(error = %self, "internal server error"),
            Self::UpstreamError(_) => tracing::error!(error = %self, "upstream service error"),
            _ => {}
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<baseroot_core::ValidationError> for AppError {
    fn from(err: baseroot_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<JournalError> for AppError {
    fn from(err: JournalError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<PinningError> for AppError {
    fn from(err: PinningError) -> Self {
        match err.status() {
            Some(404) => Self::NotFound(format!("content not found: {err}")),
            _ => Self::UpstreamError(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn status_codes() {
        assert_eq!(
            AppError::NotFound("x".into()).status_and_code(),
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        );
        assert_eq!(
            AppError::Validation("x".into()).status_and_code(),
            (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
        );
        assert_eq!(
            AppError::UpstreamError("x".into()).status_and_code().0,
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn pinning_404_maps_to_not_found() {
        let err = PinningError::ApiError {
            endpoint: "gateway".into(),
            status: 404,
            body: "".into(),
        };
        assert!(matches!(AppError::from(err), AppError::NotFound(_)));

        let err = PinningError::ApiError {
            endpoint: "gateway".into(),
            status: 503,
            body: "".into(),
        };
        assert!(matches!(AppError::from(err), AppError::UpstreamError(_)));
    }

    #[tokio::test]
    async fn internal_error_hides_detail() {
        let response = AppError::Internal("disk at /var/lib/secret full".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error.code, "INTERNAL_ERROR");
        assert!(!body.error.message.contains("secret"));
    }
}
