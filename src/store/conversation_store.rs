//! SQLite-backed conversation store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use tokio_rusqlite::Connection;

use super::StoreFuture;
use super::errors::{StoreError, StoreResult};
use super::ids::ConversationId;
use super::types::{Conversation, timestamp_from_millis};

/// Raw conversation columns as read from `SQLite`.
type ConversationRow = (ConversationId, String, i64, i64);

fn conversation_from_row((id, title, created_at, updated_at): ConversationRow) -> StoreResult<Conversation> {
    Ok(Conversation {
        id,
        title,
        created_at: timestamp_from_millis(created_at)?,
        updated_at: timestamp_from_millis(updated_at)?,
    })
}

/// Trait for conversation storage.
pub trait ConversationStore: Send + Sync {
    /// List all conversations ordered by `updated_at` DESC.
    fn list_all(&self) -> StoreFuture<'_, StoreResult<Vec<Conversation>>>;

    /// Get a conversation by ID.
    fn get(&self, id: ConversationId) -> StoreFuture<'_, StoreResult<Option<Conversation>>>;

    /// Create a new conversation record.
    fn create(&self, title: &str, now: DateTime<Utc>) -> StoreFuture<'_, StoreResult<Conversation>>;

    /// Update the title of a conversation and return the updated row.
    fn update_title(&self, id: ConversationId, title: &str) -> StoreFuture<'_, StoreResult<Conversation>>;

    /// Move `updated_at` forward to `now`.
    fn touch(&self, id: ConversationId, now: DateTime<Utc>) -> StoreFuture<'_, StoreResult<()>>;

    /// Delete a conversation together with its messages.
    fn delete(&self, id: ConversationId) -> StoreFuture<'_, StoreResult<()>>;

    /// Check if a conversation exists.
    fn exists(&self, id: ConversationId) -> StoreFuture<'_, StoreResult<bool>>;
}

/// `SQLite` implementation of the conversation store.
pub struct SqliteConversationStore {
    conn: Arc<Connection>,
    table: String,
    messages_table: String,
}

impl SqliteConversationStore {
    /// Wrap a connection whose schema is already initialized.
    #[must_use]
    pub fn new(conn: Arc<Connection>) -> Self {
        Self {
            conn,
            table: super::CONVERSATIONS_TABLE.to_string(),
            messages_table: super::MESSAGES_TABLE.to_string(),
        }
    }
}

impl ConversationStore for SqliteConversationStore {
    fn list_all(&self) -> StoreFuture<'_, StoreResult<Vec<Conversation>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let rows = self
                .conn
                .call(move |conn| {
                    let mut stmt = conn.prepare(&format!(
                        "SELECT id, title, created_at, updated_at
                         FROM {table}
                         ORDER BY updated_at DESC, rowid DESC"
                    ))?;
                    let rows = stmt
                        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)))?
                        .collect::<Result<Vec<ConversationRow>, rusqlite::Error>>()?;
                    Ok(rows)
                })
                .await?;
            rows.into_iter().map(conversation_from_row).collect()
        })
    }

    fn get(&self, id: ConversationId) -> StoreFuture<'_, StoreResult<Option<Conversation>>> {
        Box::pin(async move {
            let table = self.table.clone();
            let row = self
                .conn
                .call(move |conn| {
                    let row: Option<ConversationRow> = conn
                        .query_row(
                            &format!(
                                "SELECT id, title, created_at, updated_at FROM {table} WHERE id = ?1"
                            ),
                            rusqlite::params![id],
                            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                        )
                        .optional()?;
                    Ok(row)
                })
                .await?;
            row.map(conversation_from_row).transpose()
        })
    }

    fn create(&self, title: &str, now: DateTime<Utc>) -> StoreFuture<'_, StoreResult<Conversation>> {
        let conversation = Conversation {
            id: ConversationId::new(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        };
        Box::pin(async move {
            let table = self.table.clone();
            let row = conversation.clone();
            self.conn
                .call(move |conn| {
                    conn.execute(
                        &format!(
                            "INSERT INTO {table} (id, title, created_at, updated_at)
                             VALUES (?1, ?2, ?3, ?4)"
                        ),
                        rusqlite::params![
                            row.id,
                            row.title,
                            row.created_at.timestamp_millis(),
                            row.updated_at.timestamp_millis()
                        ],
                    )?;
                    Ok(())
                })
                .await?;
            tracing::debug!(id = %conversation.id, "created conversation");
            Ok(conversation)
        })
    }

    fn update_title(&self, id: ConversationId, title: &str) -> StoreFuture<'_, StoreResult<Conversation>> {
        let title = title.to_string();
        Box::pin(async move {
            let table = self.table.clone();
            let row = self
                .conn
                .call(move |conn| {
                    let changed = conn.execute(
                        &format!("UPDATE {table} SET title = ?1 WHERE id = ?2"),
                        rusqlite::params![title, id],
                    )?;
                    if changed == 0 {
                        return Ok(None);
                    }
                    let row: ConversationRow = conn.query_row(
                        &format!("SELECT id, title, created_at, updated_at FROM {table} WHERE id = ?1"),
                        rusqlite::params![id],
                        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                    )?;
                    Ok(Some(row))
                })
                .await?;
            let row = row.ok_or(StoreError::ConversationNotFound(id))?;
            conversation_from_row(row)
        })
    }

    fn touch(&self, id: ConversationId, now: DateTime<Utc>) -> StoreFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let table = self.table.clone();
            let now_ms = now.timestamp_millis();
            let changed = self
                .conn
                .call(move |conn| {
                    let changed = conn.execute(
                        &format!("UPDATE {table} SET updated_at = MAX(updated_at, ?1) WHERE id = ?2"),
                        rusqlite::params![now_ms, id],
                    )?;
                    Ok(changed)
                })
                .await?;
            if changed == 0 {
                return Err(StoreError::ConversationNotFound(id));
            }
            Ok(())
        })
    }

    fn delete(&self, id: ConversationId) -> StoreFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let table = self.table.clone();
            let messages_table = self.messages_table.clone();
            let changed = self
                .conn
                .call(move |conn| {
                    let tx = conn.transaction()?;
                    tx.execute(
                        &format!("DELETE FROM {messages_table} WHERE conversation_id = ?1"),
                        rusqlite::params![id],
                    )?;
                    let changed = tx.execute(
                        &format!("DELETE FROM {table} WHERE id = ?1"),
                        rusqlite::params![id],
                    )?;
                    tx.commit()?;
                    Ok(changed)
                })
                .await?;
            if changed == 0 {
                return Err(StoreError::ConversationNotFound(id));
            }
            tracing::debug!(%id, "deleted conversation");
            Ok(())
        })
    }

    fn exists(&self, id: ConversationId) -> StoreFuture<'_, StoreResult<bool>> {
        Box::pin(async move {
            let table = self.table.clone();
            let exists = self
                .conn
                .call(move |conn| {
                    let count: i64 = conn.query_row(
                        &format!("SELECT COUNT(*) FROM {table} WHERE id = ?1"),
                        rusqlite::params![id],
                        |row| row.get(0),
                    )?;
                    Ok(count > 0)
                })
                .await?;
            Ok(exists)
        })
    }
}
