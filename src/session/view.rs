//! Local view state mirrored from the datastore.

use crate::store::{ConversationId, Message};

/// Where a locally shown message stands relative to the datastore.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageState {
    /// Shown optimistically, insert still in flight.
    Pending,
    /// Stored.
    Persisted,
    /// Insert failed; shown but excluded from history.
    Failed,
}

/// A message as shown in the message list.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ViewMessage {
    /// Message row.
    pub message: Message,
    /// Sync state.
    pub state: MessageState,
}

impl ViewMessage {
    /// Wrap a message that has not been stored yet.
    #[must_use]
    pub const fn pending(message: Message) -> Self {
        Self {
            message,
            state: MessageState::Pending,
        }
    }

    /// Wrap a message read back from the datastore.
    #[must_use]
    pub const fn persisted(message: Message) -> Self {
        Self {
            message,
            state: MessageState::Persisted,
        }
    }
}

/// In-place title edit for one conversation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TitleEdit {
    /// Conversation being renamed.
    pub conversation_id: ConversationId,
    /// Current text of the edit field.
    pub buffer: String,
    /// Title when the edit started.
    pub original: String,
}

impl TitleEdit {
    /// Start an edit seeded with the current title.
    #[must_use]
    pub fn new(conversation_id: ConversationId, title: &str) -> Self {
        Self {
            conversation_id,
            buffer: title.to_string(),
            original: title.to_string(),
        }
    }

    /// Title to persist, or `None` when the edit is blank or a no-op.
    #[must_use]
    pub fn committed_title(&self) -> Option<&str> {
        let title = self.buffer.trim();
        (!title.is_empty() && title != self.original).then_some(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_committed_title_trims() {
        let mut edit = TitleEdit::new(ConversationId::new(), "old");
        edit.buffer = "  new title ".to_string();
        assert_eq!(edit.committed_title(), Some("new title"));
    }

    #[test]
    fn test_committed_title_ignores_blank_and_unchanged() {
        let mut edit = TitleEdit::new(ConversationId::new(), "old");
        assert_eq!(edit.committed_title(), None);
        edit.buffer = "   ".to_string();
        assert_eq!(edit.committed_title(), None);
    }
}
