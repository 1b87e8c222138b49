//! Conversation datastore.
//!
//! Two tables, `conversations` and `messages`, behind async store traits.
//! The `SQLite` implementations share one `tokio-rusqlite` connection.

pub mod conversation_store;
pub mod errors;
pub mod ids;
pub mod message_store;
pub mod types;

pub use conversation_store::{ConversationStore, SqliteConversationStore};
pub use errors::{StoreError, StoreResult};
pub use ids::{ConversationId, MessageId};
pub use message_store::{MessageStore, SqliteMessageStore};
pub use types::{Conversation, Message, Sender};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_rusqlite::Connection;

use crate::config::StorageConfig;

/// Boxed future type for store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Conversations table name.
pub const CONVERSATIONS_TABLE: &str = "conversations";
/// Messages table name.
pub const MESSAGES_TABLE: &str = "messages";

/// Handle bundling both stores.
#[derive(Clone)]
pub struct Datastore {
    /// Conversation rows.
    pub conversations: Arc<dyn ConversationStore>,
    /// Message rows.
    pub messages: Arc<dyn MessageStore>,
}

impl Datastore {
    /// Open (or create) the `SQLite` file named in the config.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub async fn open(config: &StorageConfig) -> StoreResult<Self> {
        let conn = Connection::open(&config.sqlite_path).await?;
        tracing::info!(path = %config.sqlite_path.display(), "opened datastore");
        Self::from_connection(conn).await
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub async fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::from_connection(conn).await
    }

    /// Create the schema on `conn` and wrap it.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub async fn from_connection(conn: Connection) -> StoreResult<Self> {
        conn.call(|conn| {
            conn.execute_batch(&format!(
                "PRAGMA foreign_keys = ON;
                CREATE TABLE IF NOT EXISTS {CONVERSATIONS_TABLE} (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL DEFAULT '',
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_{CONVERSATIONS_TABLE}_updated
                    ON {CONVERSATIONS_TABLE} (updated_at DESC);
                CREATE TABLE IF NOT EXISTS {MESSAGES_TABLE} (
                    id TEXT PRIMARY KEY,
                    conversation_id TEXT NOT NULL
                        REFERENCES {CONVERSATIONS_TABLE} (id) ON DELETE CASCADE,
                    content TEXT NOT NULL,
                    sender TEXT NOT NULL CHECK (sender IN ('user', 'bot')),
                    created_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_{MESSAGES_TABLE}_conversation_created
                    ON {MESSAGES_TABLE} (conversation_id, created_at);"
            ))?;
            Ok(())
        })
        .await?;

        let conn = Arc::new(conn);
        Ok(Self {
            conversations: Arc::new(SqliteConversationStore::new(Arc::clone(&conn))),
            messages: Arc::new(SqliteMessageStore::new(conn)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::types::timestamp_now;

    #[tokio::test]
    async fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().await.unwrap();
        let first = Datastore::from_connection(conn.clone()).await.unwrap();
        let conversation = first.conversations.create("kept", timestamp_now()).await.unwrap();

        let second = Datastore::from_connection(conn).await.unwrap();
        assert!(second.conversations.exists(conversation.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_open_file_persists_between_handles() {
        let path = std::env::temp_dir().join(format!("chatbot-ai-{}.sqlite3", ConversationId::new()));
        let config = StorageConfig {
            sqlite_path: path.clone(),
        };

        let id = {
            let store = Datastore::open(&config).await.unwrap();
            store.conversations.create("durable", timestamp_now()).await.unwrap().id
        };

        let reopened = Datastore::open(&config).await.unwrap();
        let conversation = reopened.conversations.get(id).await.unwrap().unwrap();
        assert_eq!(conversation.title, "durable");

        drop(reopened);
        let _ = std::fs::remove_file(path);
    }
}
