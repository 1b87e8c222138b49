//! Error types for the datastore.

use thiserror::Error;

use super::ids::ConversationId;

/// Datastore error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` storage error (sync).
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// `SQLite` storage error (async).
    #[error("tokio-rusqlite error: {0}")]
    TokioSqlite(#[from] tokio_rusqlite::Error),
    /// A stored row could not be decoded.
    #[error("invalid row: {0}")]
    InvalidRow(String),
    /// The referenced conversation does not exist.
    #[error("conversation not found: {0}")]
    ConversationNotFound(ConversationId),
}

/// Convenience result alias for datastore operations.
pub type StoreResult<T> = Result<T, StoreError>;
