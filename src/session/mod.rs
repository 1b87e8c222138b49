//! Chat session: the local view of conversations and messages.
//!
//! The session keeps an in-memory mirror of the datastore (conversation
//! tabs, the active conversation's messages, an optional title edit) and
//! drives two collaborators: a [`Datastore`] for persistence and a
//! [`ChatBackend`] for replies. Methods take `&mut self`, so a session
//! processes one user action at a time.

pub mod client;
pub mod command;
pub mod error;
pub mod render;
pub mod view;

pub use client::{ChatBackend, HttpChatClient};
pub use command::Command;
pub use error::{SessionError, SessionResult};
pub use view::{MessageState, TitleEdit, ViewMessage};

use chrono::{DateTime, Utc};

use crate::llm::TurnRole;
use crate::server::models::{ChatRequest, HistoryTurn};
use crate::store::types::{DEFAULT_TITLE, timestamp_now, title_from_message};
use crate::store::{Conversation, ConversationId, Datastore, Message, Sender, StoreError};

/// Local chat state plus the collaborators that keep it in sync.
pub struct ChatSession<B> {
    store: Datastore,
    backend: B,
    conversations: Vec<Conversation>,
    active: Option<ConversationId>,
    messages: Vec<ViewMessage>,
    title_edit: Option<TitleEdit>,
    loading: bool,
}

impl<B: ChatBackend> ChatSession<B> {
    /// Create an empty session. Call [`Self::load`] before use.
    #[must_use]
    pub fn new(store: Datastore, backend: B) -> Self {
        Self {
            store,
            backend,
            conversations: Vec::new(),
            active: None,
            messages: Vec::new(),
            title_edit: None,
            loading: false,
        }
    }

    /// Conversations, most recently updated first.
    #[must_use]
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Active conversation id.
    #[must_use]
    pub const fn active_id(&self) -> Option<ConversationId> {
        self.active
    }

    /// Active conversation row.
    #[must_use]
    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.active.and_then(|id| self.find(id))
    }

    /// Messages of the active conversation, oldest first.
    #[must_use]
    pub fn messages(&self) -> &[ViewMessage] {
        &self.messages
    }

    /// Open title edit, if any.
    #[must_use]
    pub const fn title_edit(&self) -> Option<&TitleEdit> {
        self.title_edit.as_ref()
    }

    /// Whether a reply is being awaited.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    fn find(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Load conversations and select one.
    ///
    /// Keeps the current selection if it still exists, otherwise picks the
    /// most recently updated conversation.
    ///
    /// # Errors
    /// Returns an error if the datastore cannot be read.
    pub async fn load(&mut self) -> SessionResult<()> {
        self.conversations = self.store.conversations.list_all().await?;
        let keep = self.active.filter(|id| self.find(*id).is_some());
        let target = keep.or_else(|| self.conversations.first().map(|c| c.id));

        match target {
            Some(id) => self.load_messages(id).await?,
            None => {
                self.active = None;
                self.messages.clear();
            }
        }
        tracing::debug!(count = self.conversations.len(), "loaded conversations");
        Ok(())
    }

    async fn load_messages(&mut self, id: ConversationId) -> SessionResult<()> {
        let rows = self.store.messages.list_for_conversation(id).await?;
        self.messages = rows.into_iter().map(ViewMessage::persisted).collect();
        self.active = Some(id);
        Ok(())
    }

    /// Switch to another conversation and load its messages.
    ///
    /// # Errors
    /// Returns [`SessionError::UnknownConversation`] for ids not in the list,
    /// or a datastore error; state is unchanged on error.
    pub async fn select(&mut self, id: ConversationId) -> SessionResult<()> {
        if self.find(id).is_none() {
            return Err(SessionError::UnknownConversation(id));
        }
        self.load_messages(id).await
    }

    /// Create an empty conversation and make it active.
    ///
    /// # Errors
    /// Returns an error if the datastore insert fails.
    pub async fn new_conversation(&mut self) -> SessionResult<ConversationId> {
        self.start_conversation(DEFAULT_TITLE).await
    }

    async fn start_conversation(&mut self, title: &str) -> SessionResult<ConversationId> {
        let conversation = self.store.conversations.create(title, timestamp_now()).await?;
        let id = conversation.id;
        self.conversations.insert(0, conversation);
        self.active = Some(id);
        self.messages.clear();
        tracing::info!(%id, "started conversation");
        Ok(id)
    }

    /// Prior turns of the active conversation, as sent to the chat server.
    fn history(&self) -> Vec<HistoryTurn> {
        self.messages
            .iter()
            .filter(|m| m.state != MessageState::Failed)
            .map(|m| HistoryTurn {
                role: match m.message.sender {
                    Sender::User => TurnRole::User,
                    Sender::Bot => TurnRole::Model,
                }
                .as_str()
                .to_string(),
                content: m.message.content.clone(),
            })
            .collect()
    }

    /// Mirror an `updated_at` bump and move the conversation to the top.
    fn bump(&mut self, id: ConversationId, at: DateTime<Utc>) {
        if let Some(index) = self.conversations.iter().position(|c| c.id == id) {
            let mut conversation = self.conversations.remove(index);
            conversation.updated_at = conversation.updated_at.max(at);
            self.conversations.insert(0, conversation);
        }
        self.conversations
            .sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    }

    /// Append a view message, store it, and reconcile its state.
    async fn append(&mut self, message: Message) -> SessionResult<()> {
        let index = self.messages.len();
        self.messages.push(ViewMessage::pending(message.clone()));

        match self.store.messages.insert(&message).await {
            Ok(stored) => {
                self.bump(stored.conversation_id, stored.created_at);
                self.messages[index] = ViewMessage::persisted(stored);
                Ok(())
            }
            Err(err) => {
                self.messages[index].state = MessageState::Failed;
                tracing::error!(error = %err, "failed to store message");
                Err(err.into())
            }
        }
    }

    /// Send user text and wait for the reply.
    ///
    /// Blank input is ignored. With no active conversation one is created,
    /// titled after the message. Returns the stored bot message.
    ///
    /// # Errors
    /// Returns an error if storing either message fails or the chat server
    /// call fails; the user message stays in the list either way.
    pub async fn send(&mut self, text: &str) -> SessionResult<Option<Message>> {
        let content = text.trim();
        if content.is_empty() {
            return Ok(None);
        }

        let conversation_id = match self.active {
            Some(id) => id,
            None => self.start_conversation(&title_from_message(content)).await?,
        };

        let request = ChatRequest {
            message: content.to_string(),
            history: self.history(),
        };

        self.append(Message::user(conversation_id, content)).await?;

        self.loading = true;
        let reply = self.backend.reply(&request).await;
        self.loading = false;
        let reply = reply.inspect_err(|err| {
            tracing::error!(error = %err, "chat request failed");
        })?;

        let bot = Message::bot(conversation_id, reply);
        self.append(bot.clone()).await?;
        Ok(Some(bot))
    }

    /// Open the title editor for a conversation.
    ///
    /// # Errors
    /// Returns [`SessionError::UnknownConversation`] for ids not in the list.
    pub fn begin_rename(&mut self, id: ConversationId) -> SessionResult<()> {
        let conversation = self.find(id).ok_or(SessionError::UnknownConversation(id))?;
        self.title_edit = Some(TitleEdit::new(id, &conversation.title));
        Ok(())
    }

    /// Replace the edit buffer. Ignored when no edit is open.
    pub fn edit_title(&mut self, text: &str) {
        if let Some(edit) = self.title_edit.as_mut() {
            text.clone_into(&mut edit.buffer);
        }
    }

    /// Drop the open edit without saving.
    pub fn cancel_rename(&mut self) {
        self.title_edit = None;
    }

    /// Save the open edit (Enter / blur).
    ///
    /// Blank or unchanged titles close the editor without a datastore call.
    /// On failure the editor stays open so the edit is not lost.
    ///
    /// # Errors
    /// Returns an error if the datastore update fails.
    pub async fn commit_rename(&mut self) -> SessionResult<Option<Conversation>> {
        let Some(edit) = self.title_edit.take() else {
            return Ok(None);
        };
        let Some(title) = edit.committed_title() else {
            return Ok(None);
        };

        match self.store.conversations.update_title(edit.conversation_id, title).await {
            Ok(updated) => {
                if let Some(local) = self.conversations.iter_mut().find(|c| c.id == updated.id) {
                    local.title.clone_from(&updated.title);
                }
                Ok(Some(updated))
            }
            Err(err) => {
                self.title_edit = Some(edit);
                Err(err.into())
            }
        }
    }

    /// Delete a conversation and reconcile the local list.
    ///
    /// Deleting the active conversation selects the most recent remaining
    /// one, or clears the selection when none remain.
    ///
    /// # Errors
    /// Returns an error if the datastore delete fails.
    pub async fn delete(&mut self, id: ConversationId) -> SessionResult<()> {
        match self.store.conversations.delete(id).await {
            Ok(()) | Err(StoreError::ConversationNotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }

        self.conversations.retain(|c| c.id != id);
        if self.title_edit.as_ref().is_some_and(|e| e.conversation_id == id) {
            self.title_edit = None;
        }

        if self.active == Some(id) {
            match self.conversations.first().map(|c| c.id) {
                Some(next) => self.load_messages(next).await?,
                None => {
                    self.active = None;
                    self.messages.clear();
                }
            }
        }
        tracing::info!(%id, "deleted conversation");
        Ok(())
    }
}
