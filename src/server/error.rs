//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`firesize_core::Error`] so that route
//! handlers can return pipeline failures directly.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError {
    inner: firesize_core::Error,
}

impl AppError {
    pub fn new(inner: firesize_core::Error) -> Self {
        Self { inner }
    }
}

impl From<firesize_core::Error> for AppError {
    fn from(e: firesize_core::Error) -> Self {
        Self::new(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(status = %status, error = %self.inner, "request failed");
        } else {
            tracing::debug!(status = %status, error = %self.inner, "request rejected");
        }

        let code = match &self.inner {
            firesize_core::Error::Workspace { .. } => "workspace_error",
            firesize_core::Error::FetchFile { .. }
            | firesize_core::Error::Download { .. }
            | firesize_core::Error::FetchCopy { .. } => "fetch_error",
            firesize_core::Error::Timeout { .. } => "timeout",
            firesize_core::Error::Spawn { .. }
            | firesize_core::Error::ToolFailed { .. }
            | firesize_core::Error::Tool { .. } => "tool_error",
            firesize_core::Error::Validation(_) => "validation_error",
        };

        let body = json!({
            "error": self.inner.to_string(),
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
