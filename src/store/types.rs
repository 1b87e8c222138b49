//! Row types for conversations and messages.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{StoreError, StoreResult};
use super::ids::{ConversationId, MessageId};

/// Title given to conversations created explicitly.
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Longest title derived from a message.
pub const MAX_DERIVED_TITLE_CHARS: usize = 50;

/// Current time truncated to the millisecond precision the store keeps.
#[must_use]
pub fn timestamp_now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Decode a stored millisecond timestamp.
///
/// # Errors
/// Returns an error if the value is out of chrono's range.
pub fn timestamp_from_millis(ms: i64) -> StoreResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| StoreError::InvalidRow(format!("invalid timestamp: {ms}")))
}

/// Derive a conversation title from the first message typed into it.
#[must_use]
pub fn title_from_message(content: &str) -> String {
    let title: String = content
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(MAX_DERIVED_TITLE_CHARS)
        .collect();
    if title.is_empty() {
        DEFAULT_TITLE.to_string()
    } else {
        title
    }
}

/// Who wrote a message.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    /// The person chatting.
    User,
    /// The model's reply.
    Bot,
}

impl Sender {
    /// Stable string form for storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Bot => "bot",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Sender {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "bot" => Ok(Self::Bot),
            _ => Err(value.to_string()),
        }
    }
}

/// A conversation row.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Row id.
    pub id: ConversationId,
    /// User-editable title.
    pub title: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last message or creation time.
    pub updated_at: DateTime<Utc>,
}

/// A message row.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Row id.
    pub id: MessageId,
    /// Owning conversation.
    pub conversation_id: ConversationId,
    /// Message text.
    pub content: String,
    /// Author tag.
    pub sender: Sender,
    /// Creation time; orders messages within a conversation.
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Build a new, not yet stored message.
    #[must_use]
    pub fn new(
        conversation_id: ConversationId,
        sender: Sender,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MessageId::new(),
            conversation_id,
            content: content.into(),
            sender,
            created_at,
        }
    }

    /// Build a user message stamped now.
    #[must_use]
    pub fn user(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self::new(conversation_id, Sender::User, content, timestamp_now())
    }

    /// Build a bot message stamped now.
    #[must_use]
    pub fn bot(conversation_id: ConversationId, content: impl Into<String>) -> Self {
        Self::new(conversation_id, Sender::Bot, content, timestamp_now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_round_trips_through_str() {
        for sender in [Sender::User, Sender::Bot] {
            assert_eq!(sender.as_str().parse::<Sender>().unwrap(), sender);
        }
        assert!("assistant".parse::<Sender>().is_err());
    }

    #[test]
    fn test_timestamp_now_has_millisecond_precision() {
        let now = timestamp_now();
        assert_eq!(timestamp_from_millis(now.timestamp_millis()).unwrap(), now);
    }

    #[test]
    fn test_title_from_message_truncates_and_collapses_whitespace() {
        assert_eq!(title_from_message("  hello \n  world "), "hello world");
        let long = "x".repeat(80);
        assert_eq!(title_from_message(&long).chars().count(), MAX_DERIVED_TITLE_CHARS);
        assert_eq!(title_from_message("   "), DEFAULT_TITLE);
    }

    #[test]
    fn test_message_constructors_tag_sender() {
        let conversation = ConversationId::new();
        assert_eq!(Message::user(conversation, "hi").sender, Sender::User);
        assert_eq!(Message::bot(conversation, "hello").sender, Sender::Bot);
    }
}
