//! Provider-neutral request types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Author of a prior turn sent as context.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// Text typed by the user.
    User,
    /// Text produced by the model.
    Model,
}

impl TurnRole {
    /// Stable string form, matching the provider's role names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TurnRole {
    type Err = String;

    /// Accepts the provider's names plus the aliases used by chat UIs.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "model" | "assistant" | "bot" => Ok(Self::Model),
            _ => Err(value.to_string()),
        }
    }
}

/// One prior turn of a conversation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Who wrote the turn.
    pub role: TurnRole,
    /// Turn text.
    pub content: String,
}

impl Turn {
    /// Build a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Build a model turn.
    #[must_use]
    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            content: content.into(),
        }
    }
}

/// A single generation call: prior turns followed by the new prompt.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GenerationRequest {
    /// Earlier turns, oldest first.
    pub history: Vec<Turn>,
    /// New user text.
    pub prompt: String,
}

impl GenerationRequest {
    /// Build a request with no history.
    #[must_use]
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            history: Vec::new(),
            prompt: prompt.into(),
        }
    }

    /// Attach prior turns.
    #[must_use]
    pub fn with_history(mut self, history: Vec<Turn>) -> Self {
        self.history = history;
        self
    }
}
