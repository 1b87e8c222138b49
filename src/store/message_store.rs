//! SQLite-backed message store.

use std::str::FromStr;
use std::sync::Arc;

use tokio_rusqlite::Connection;

use super::StoreFuture;
use super::errors::{StoreError, StoreResult};
use super::ids::{ConversationId, MessageId};
use super::types::{Message, Sender, timestamp_from_millis};

/// Raw message columns as read from `SQLite`.
type MessageRow = (MessageId, ConversationId, String, String, i64);

fn message_from_row((id, conversation_id, content, sender, created_at): MessageRow) -> StoreResult<Message> {
    let sender = Sender::from_str(&sender)
        .map_err(|err| StoreError::InvalidRow(format!("invalid sender: {err}")))?;
    Ok(Message {
        id,
        conversation_id,
        content,
        sender,
        created_at: timestamp_from_millis(created_at)?,
    })
}

/// Trait for message storage.
pub trait MessageStore: Send + Sync {
    /// Insert a message and bump its conversation's `updated_at`.
    ///
    /// # Errors
    /// Returns [`StoreError::ConversationNotFound`] if the owning conversation
    /// does not exist.
    fn insert(&self, message: &Message) -> StoreFuture<'_, StoreResult<Message>>;

    /// Load every message of a conversation ordered by `created_at` ASC.
    fn list_for_conversation(&self, conversation_id: ConversationId) -> StoreFuture<'_, StoreResult<Vec<Message>>>;

    /// Count the messages of a conversation.
    fn count_for_conversation(&self, conversation_id: ConversationId) -> StoreFuture<'_, StoreResult<u64>>;
}

/// `SQLite` implementation of the message store.
pub struct SqliteMessageStore {
    conn: Arc<Connection>,
    table: String,
    conversations_table: String,
}

impl SqliteMessageStore {
    /// Wrap a connection whose schema is already initialized.
    #[must_use]
    pub fn new(conn: Arc<Connection>) -> Self {
        Self {
            conn,
            table: super::MESSAGES_TABLE.to_string(),
            conversations_table: super::CONVERSATIONS_TABLE.to_string(),
        }
    }
}

impl MessageStore for SqliteMessageStore {
    fn insert(&self, message: &Message) -> StoreFuture<'_, StoreResult<Message>> {
        let message = message.clone();
        Box::pin(async move {
            let table = self.table.clone();
            let conversations = self.conversations_table.clone();
            let row = message.clone();
            let inserted = self
                .conn
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    let created_ms = row.created_at.timestamp_millis();
                    let touched = tx.execute(
                        &format!(
                            "UPDATE {conversations} SET updated_at = MAX(updated_at, ?1) WHERE id = ?2"
                        ),
                        rusqlite::params![created_ms, row.conversation_id],
                    )?;
                    if touched == 0 {
                        return Ok(false);
                    }
                    tx.execute(
                        &format!(
                            "INSERT INTO {table} (id, conversation_id, content, sender, created_at)
                             VALUES (?1, ?2, ?3, ?4, ?5)"
                        ),
                        rusqlite::params![
                            row.id,
                            row.conversation_id,
                            row.content,
                            row.sender.as_str(),
                            created_ms
                        ],
                    )?;
                    tx.commit()?;
                    Ok(true)
                })
                .await?;

            if !inserted {
                return Err(StoreError::ConversationNotFound(message.conversation_id));
            }
            Ok(message)
        })
    }

    fn list_for_conversation(&self, conversation_id: ConversationId) -> StoreFuture<'_, StoreResult<Vec<Message>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let rows = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT id, conversation_id, content, sender, created_at
                         FROM {table}
                         WHERE conversation_id = ?1
                         ORDER BY created_at ASC, rowid ASC"
                    ))?;
                    let rows = stmt
                        .query_map(rusqlite::params![conversation_id], |row| {
                            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
                        })?
                        .collect::<Result<Vec<MessageRow>, rusqlite::Error>>()?;
                    Ok(rows)
                })
                .await?;
            rows.into_iter().map(message_from_row).collect()
        })
    }

    fn count_for_conversation(&self, conversation_id: ConversationId) -> StoreFuture<'_, StoreResult<u64>> {
        Box::pin(async move {
            let table = self.table.clone();
            let count = self
                .conn
                .call(move |conn| {
                    let count: i64 = conn.query_row(
                        &format!("SELECT COUNT(*) FROM {table} WHERE conversation_id = ?1"),
                        rusqlite::params![conversation_id],
                        |row| row.get(0),
                    )?;
                    Ok(count)
                })
                .await?;
            u64::try_from(count).map_err(|_| StoreError::InvalidRow("invalid message count".to_string()))
        })
    }
}
