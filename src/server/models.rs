//! JSON bodies exchanged over HTTP.

use serde::{Deserialize, Serialize};

use crate::store::Sender;

/// Body of `POST /api/chat`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatRequest {
    /// New user text.
    pub message: String,
    /// Earlier turns of the conversation, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<HistoryTurn>,
}

/// One earlier turn, role-tagged.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
pub struct HistoryTurn {
    /// `user`, or `model` / `assistant` / `bot`.
    pub role: String,
    /// Turn text.
    pub content: String,
}

/// Successful chat reply.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ChatResponse {
    /// Generated text.
    pub response: String,
}

/// Error envelope returned by every failing route.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ErrorBody {
    /// Human-readable error.
    pub error: String,
}

/// Body of `POST /api/conversations`.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CreateConversationRequest {
    /// Optional initial title.
    #[serde(default)]
    pub title: Option<String>,
}

/// Body of `PATCH /api/conversations/{id}`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RenameConversationRequest {
    /// New title.
    pub title: String,
}

/// Body of `POST /api/conversations/{id}/messages`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CreateMessageRequest {
    /// Message text.
    pub content: String,
    /// Author tag.
    pub sender: Sender,
}
