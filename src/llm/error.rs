//! Error types for the generative provider client.

use thiserror::Error;

/// Provider client error type.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No credential configured for the provider.
    #[error("provider API key is not configured")]
    MissingApiKey,
    /// Transport-level failure (connect, timeout, body decode).
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider answered with a non-success status.
    #[error("provider returned HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body, if any.
        message: String,
    },
    /// Provider answered 200 with an error payload.
    #[error("provider error: {0}")]
    Provider(String),
    /// Provider answered without any usable text.
    #[error("provider returned an empty response")]
    EmptyResponse,
}

/// Convenience result alias for provider operations.
pub type LlmResult<T> = Result<T, LlmError>;
