//! Error types for memento.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::consistency::PartialUpload;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Caller input rejected before any store was touched.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // === Server Errors ===
    /// The relational record store failed.
    #[error("Database error: {0}")]
    Database(String),

    /// The object store failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A batch of files produced fewer object + record pairs than submitted.
    #[error("Partial upload: {} of {} file(s) stored and recorded", .0.succeeded, .0.total)]
    PartialUpload(Box<PartialUpload>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,

            // Some side effects happened; the body says which.
            Self::PartialUpload(_) => StatusCode::MULTI_STATUS,

            // 5xx Server Errors
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Storage(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::PartialUpload(_) => "PARTIAL_UPLOAD",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Returns whether some side effect happened before the error.
    #[must_use]
    pub const fn is_partial(&self) -> bool {
        matches!(self, Self::PartialUpload(_))
    }
}

impl From<PartialUpload> for AppError {
    fn from(report: PartialUpload) -> Self {
        Self::PartialUpload(Box::new(report))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else if self.is_partial() {
            tracing::warn!(error = %self, code = code, "Request partially applied");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let details = match &self {
            Self::PartialUpload(report) => serde_json::to_value(report.as_ref()).ok(),
            _ => None,
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
                "details": details,
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
