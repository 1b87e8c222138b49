//! HTTP route handlers for the chat API.

use std::any::Any;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use tower_http::catch_panic::CatchPanicLayer;

use crate::llm::{GenerationRequest, LlmError, Turn, TurnRole};
use crate::store::types::{DEFAULT_TITLE, timestamp_now};
use crate::store::{Conversation, ConversationId, Message};

use super::error::ApiError;
use super::models::{
    ChatRequest, ChatResponse, CreateConversationRequest, CreateMessageRequest,
    RenameConversationRequest,
};
use super::state::AppState;

/// Create the API router with all routes.
///
/// Panics raised while handling a request become a 500 error envelope.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_completion))
        .route(
            "/api/conversations",
            get(list_conversations).post(create_conversation),
        )
        .route(
            "/api/conversations/{id}",
            patch(rename_conversation).delete(delete_conversation),
        )
        .route(
            "/api/conversations/{id}/messages",
            get(list_messages).post(create_message),
        )
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(detail, "request handler panicked");
    ApiError::Internal.into_response()
}

/// Health check endpoint.
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "chatbot-ai",
        "version": env!("CARGO_PKG_VERSION"),
        "model": state.generator.as_ref().map(|g| g.model_name().to_string()),
    }))
}

/// Turn a chat body into a generation request.
///
/// The error string is for the log only; clients see the generic envelope.
fn generation_request(request: ChatRequest) -> Result<GenerationRequest, String> {
    if request.message.trim().is_empty() {
        return Err("message is blank".to_string());
    }

    let history = request
        .history
        .into_iter()
        .map(|turn| match turn.role.parse::<TurnRole>() {
            Ok(TurnRole::User) => Ok(Turn::user(turn.content)),
            Ok(TurnRole::Model) => Ok(Turn::model(turn.content)),
            Err(role) => Err(format!("invalid history role: {role}")),
        })
        .collect::<Result<Vec<_>, String>>()?;

    Ok(GenerationRequest::new(request.message).with_history(history))
}

/// Handle chat completion requests.
async fn chat_completion(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::error!(error = %rejection, "malformed chat request");
        ApiError::Internal
    })?;

    let Some(generator) = state.generator.as_ref() else {
        tracing::error!("chat request refused: no provider API key configured");
        return Err(ApiError::MissingApiKey);
    };

    let generation = generation_request(request).map_err(|reason| {
        tracing::error!(%reason, "rejected chat request");
        ApiError::Internal
    })?;
    tracing::debug!(
        model = generator.model_name(),
        history = generation.history.len(),
        "forwarding chat message"
    );

    match generator.generate(&generation).await {
        Ok(response) if !response.is_empty() => Ok(Json(ChatResponse { response })),
        Ok(_) | Err(LlmError::EmptyResponse) => {
            tracing::error!("no valid response received from the model");
            Err(ApiError::InvalidModelResponse)
        }
        Err(err) => {
            tracing::error!(error = %err, "chat generation failed");
            Err(ApiError::Internal)
        }
    }
}

/// List conversations, most recently updated first.
async fn list_conversations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Conversation>>, ApiError> {
    Ok(Json(state.store.conversations.list_all().await?))
}

/// Create a conversation.
async fn create_conversation(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateConversationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Conversation>), ApiError> {
    let Json(request) = payload?;
    let title = request
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TITLE);
    let conversation = state
        .store
        .conversations
        .create(title, timestamp_now())
        .await?;
    Ok((StatusCode::CREATED, Json(conversation)))
}

/// Rename a conversation.
async fn rename_conversation(
    State(state): State<Arc<AppState>>,
    id: Result<Path<ConversationId>, PathRejection>,
    payload: Result<Json<RenameConversationRequest>, JsonRejection>,
) -> Result<Json<Conversation>, ApiError> {
    let Path(id) = id?;
    let Json(request) = payload?;
    let title = request.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Title is required".to_string()));
    }
    let conversation = state.store.conversations.update_title(id, title).await?;
    Ok(Json(conversation))
}

/// Delete a conversation and its messages.
async fn delete_conversation(
    State(state): State<Arc<AppState>>,
    id: Result<Path<ConversationId>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(id) = id?;
    state.store.conversations.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List a conversation's messages, oldest first.
async fn list_messages(
    State(state): State<Arc<AppState>>,
    id: Result<Path<ConversationId>, PathRejection>,
) -> Result<Json<Vec<Message>>, ApiError> {
    let Path(id) = id?;
    if !state.store.conversations.exists(id).await? {
        return Err(ApiError::NotFound("Conversation not found".to_string()));
    }
    Ok(Json(state.store.messages.list_for_conversation(id).await?))
}

/// Append a message to a conversation.
async fn create_message(
    State(state): State<Arc<AppState>>,
    id: Result<Path<ConversationId>, PathRejection>,
    payload: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    let Path(id) = id?;
    let Json(request) = payload?;
    if request.content.trim().is_empty() {
        return Err(ApiError::BadRequest("Content is required".to_string()));
    }
    let message = Message::new(id, request.sender, request.content, timestamp_now());
    let stored = state.store.messages.insert(&message).await?;
    Ok((StatusCode::CREATED, Json(stored)))
}
