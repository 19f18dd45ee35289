//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Only the three client-error modes of the media subsystem ever become
//! non-2xx responses; decode failures degrade to a placeholder 200 in the
//! handler and never reach this type.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "INVALID_PATH").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type for the media endpoint.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Requested path escapes the trusted media root (400).
    #[error("invalid path")]
    InvalidPath,

    /// Extension not in the supported whitelist (400).
    #[error("unsupported file type")]
    UnsupportedFormat,

    /// Source asset does not exist (404). Never cached as a negative result.
    #[error("not found")]
    NotFound,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::InvalidPath => (StatusCode::BAD_REQUEST, "INVALID_PATH"),
            Self::UnsupportedFormat => (StatusCode::BAD_REQUEST, "UNSUPPORTED_FORMAT"),
            Self::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
