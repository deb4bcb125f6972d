//! Common error types for the inpainting gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Message returned to clients when the inference backend fails.
/// The underlying cause is only logged.
pub const BACKEND_FAILURE_MESSAGE: &str = "Inference failed";

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Could not decode image: {0}")]
    Decode(String),

    #[error("Image too large: {width}x{height} exceeds the {limit}px limit on the longer side")]
    SizeLimitExceeded { width: u32, height: u32, limit: u32 },

    #[error("Image too large: request body exceeds the {limit} byte limit")]
    BodyTooLarge { limit: usize },

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Discriminant of [`AppError`], recorded on failed jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedInput,
    Decode,
    SizeLimitExceeded,
    Backend,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::MalformedInput(_) => ErrorKind::MalformedInput,
            AppError::Decode(_) => ErrorKind::Decode,
            AppError::SizeLimitExceeded { .. } | AppError::BodyTooLarge { .. } => ErrorKind::SizeLimitExceeded,
            AppError::Backend(_) => ErrorKind::Backend,
            AppError::Config(_) | AppError::Io(_) | AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Message shown to the client. Backend detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Backend(_) => BACKEND_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Decode(err.to_string())
    }
}

/// Error response body. `detail` is what browser clients read.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
    pub code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code) = match &self {
            AppError::SizeLimitExceeded { .. } | AppError::BodyTooLarge { .. } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "invalid_request_error",
                Some("image_too_large"),
            ),
            AppError::MalformedInput(_) => (StatusCode::BAD_REQUEST, "invalid_request_error", Some("malformed_input")),
            AppError::Decode(_) => (StatusCode::BAD_REQUEST, "invalid_request_error", Some("decode_error")),
            AppError::Backend(_) => (StatusCode::BAD_REQUEST, "backend_error", None),
            AppError::Config(_) | AppError::Io(_) | AppError::Internal(_) => {
                (StatusCode::BAD_REQUEST, "server_error", None)
            }
        };

        let message = self.public_message();
        let body = Json(ErrorResponse {
            detail: message.clone(),
            error: ErrorDetail {
                message,
                r#type: error_type.to_string(),
                code: code.map(|c| c.to_string()),
            },
        });

        (status, body).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
