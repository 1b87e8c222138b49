//! Error types for the chat session.

use thiserror::Error;

use crate::store::{ConversationId, StoreError};

/// Chat session error type.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Datastore call failed.
    #[error("datastore error: {0}")]
    Store(#[from] StoreError),
    /// The chat server could not be reached or answered garbage.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    /// The chat server answered with an error envelope.
    #[error("chat server returned HTTP {status}: {message}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// The `error` field of the body, or a placeholder.
        message: String,
    },
    /// The conversation is not in the local list.
    #[error("unknown conversation: {0}")]
    UnknownConversation(ConversationId),
}

/// Convenience result alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
