//! Error handling module.
//!
//! This module provides unified error handling with proper HTTP status code mapping
//! and standardized API error responses.

pub mod codes;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

pub use codes::ErrorCode;

/// Application-level error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Sequence configuration not found.
    #[error("Sequence configuration not found: {0}")]
    ConfigNotFound(String),

    /// Allocation requested for a disabled document type.
    #[error("Sequence configuration is inactive: {0}")]
    InactiveConfig(String),

    /// Invalid format template, custom pattern, or date format.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Identifier already present in the used index.
    #[error("Identifier already used: {0}")]
    AlreadyUsed(String),

    /// Allocation retry bound exhausted without a free identifier.
    #[error("Sequence space exhausted for: {0}")]
    ExhaustedSequenceSpace(String),

    /// Authentication failed.
    #[error("Authentication failed")]
    Unauthorized,

    /// Insufficient permissions.
    #[error("Insufficient permissions")]
    Forbidden,

    /// Invalid request parameters.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the error code for this error.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::ConfigNotFound(_) => ErrorCode::CONFIG_NOT_FOUND,
            Self::InactiveConfig(_) => ErrorCode::INACTIVE_CONFIG,
            Self::InvalidFormat(_) => ErrorCode::INVALID_FORMAT,
            Self::AlreadyUsed(_) => ErrorCode::ALREADY_USED,
            Self::ExhaustedSequenceSpace(_) => ErrorCode::EXHAUSTED_SEQUENCE_SPACE,
            Self::Unauthorized => ErrorCode::UNAUTHORIZED,
            Self::Forbidden => ErrorCode::FORBIDDEN,
            Self::BadRequest(_) => ErrorCode::BAD_REQUEST,
            Self::NotFound(_) => ErrorCode::NOT_FOUND,
            Self::Storage(_) => ErrorCode::STORAGE_ERROR,
            Self::Internal(_) => ErrorCode::INTERNAL_ERROR,
        }
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::ConfigNotFound(_) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InactiveConfig(_) | Self::AlreadyUsed(_) => StatusCode::CONFLICT,
            Self::InvalidFormat(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::ExhaustedSequenceSpace(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code().as_i32();
        let message = self.to_string();

        tracing::error!(
            error_code = code,
            status = %status,
            message = %message,
            "Request failed"
        );

        let body = Json(json!({
            "code": code,
            "message": message,
            "data": null
        }));

        (status, body).into_response()
    }
}

/// Storage-specific error type.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Lock acquisition failed.
    #[error("Failed to acquire lock: {0}")]
    LockFailed(String),

    /// File I/O error.
    #[error("File I/O error: {0}")]
    FileIO(String),

    /// Data not found.
    #[error("Data not found: {0}")]
    NotFound(String),

    /// Backend not available.
    #[error("Storage backend unavailable")]
    Unavailable,
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::FileIO(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias using `StorageError`.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
