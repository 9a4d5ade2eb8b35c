//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use memento_common::InconsistencyWarning;
use serde::Serialize;

/// Standard API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    /// Set when the operation went through but left the stores out of step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<InconsistencyWarning>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self {
            data,
            warning: None,
        }
    }

    /// Create a success response carrying an inconsistency warning.
    pub const fn with_warning(data: T, warning: Option<InconsistencyWarning>) -> Self {
        Self { data, warning }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
