//! Plain-text rendering of session state for the terminal.

use std::fmt::Write as _;

use crate::store::{Conversation, ConversationId, Sender};

use super::view::{MessageState, ViewMessage};

/// Numbered conversation tabs, active one marked with `*`.
#[must_use]
pub fn render_tabs(conversations: &[Conversation], active: Option<ConversationId>) -> String {
    if conversations.is_empty() {
        return "No conversations yet.".to_string();
    }
    let mut out = String::new();
    for (i, conversation) in conversations.iter().enumerate() {
        let marker = if Some(conversation.id) == active { '*' } else { ' ' };
        let _ = writeln!(out, "{marker} {}. {}", i + 1, conversation.title);
    }
    out
}

/// One message line.
#[must_use]
pub fn render_message(message: &ViewMessage) -> String {
    let who = match message.message.sender {
        Sender::User => "you",
        Sender::Bot => "bot",
    };
    let suffix = match message.state {
        MessageState::Persisted => "",
        MessageState::Pending => " (sending)",
        MessageState::Failed => " (not saved)",
    };
    format!("{who}> {}{suffix}", message.message.content)
}

/// The full message list.
#[must_use]
pub fn render_messages(messages: &[ViewMessage]) -> String {
    messages
        .iter()
        .map(render_message)
        .collect::<Vec<_>>()
        .join("\n")
}
