//! HTTP error envelope.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::store::StoreError;

use super::models::ErrorBody;

/// Errors surfaced by route handlers. The display text is sent to clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No provider credential configured.
    #[error("API key not configured")]
    MissingApiKey,
    /// Provider answered without usable text.
    #[error("Invalid response from AI model")]
    InvalidModelResponse,
    /// Request failed validation.
    #[error("{0}")]
    BadRequest(String),
    /// Referenced row does not exist.
    #[error("{0}")]
    NotFound(String),
    /// Anything else; details go to the log only.
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::MissingApiKey | Self::InvalidModelResponse | Self::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConversationNotFound(_) => Self::NotFound("Conversation not found".to_string()),
            other => {
                tracing::error!(error = %other, "datastore failure");
                Self::Internal
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection, "rejected request body");
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection, "rejected path parameter");
        Self::BadRequest(rejection.body_text())
    }
}
