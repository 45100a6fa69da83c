//! HTTP error mapping.
//!
//! Every API failure becomes a JSON body `{"error": "<notice>"}` with a
//! status derived from the underlying error.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use card_core::CardError;
use card_renderer::RenderError;
use serde_json::json;
use thiserror::Error;

use crate::proxy::ProxyError;
use crate::validation::ValidationError;

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected user input.
    #[error(transparent)]
    Card(#[from] CardError),
    /// Rendering or encoding failed.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// Fetching a remote image failed.
    #[error(transparent)]
    Proxy(#[from] ProxyError),
    /// Malformed identifier.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// A blocking task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(String),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Card(err) => card_status(err),
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Render(_) | Self::Proxy(_) | Self::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn card_status(err: &CardError) -> StatusCode {
    match err {
        CardError::EmptyVerseText
        | CardError::NoVerseSelected
        | CardError::EmptyUpload
        | CardError::InvalidImageUrl(_) => StatusCode::BAD_REQUEST,
        CardError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        CardError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        CardError::PopularIndexOutOfRange { .. } => StatusCode::NOT_FOUND,
        CardError::ExportInProgress => StatusCode::CONFLICT,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
