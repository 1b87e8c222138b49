//! End-to-end chat flow: terminal session -> HTTP -> router -> generator.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use chatbot_ai::config::ClientConfig;
use chatbot_ai::llm::{GenerationRequest, LlmResult, TextGenerator, TurnRole};
use chatbot_ai::server::{AppState, create_router};
use chatbot_ai::session::{ChatSession, HttpChatClient, MessageState, SessionError};
use chatbot_ai::store::{Datastore, Sender};

/// Replies with a numbered echo and remembers every request.
#[derive(Default)]
struct RecordingGenerator {
    seen: Mutex<Vec<GenerationRequest>>,
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    fn model_name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, request: &GenerationRequest) -> LlmResult<String> {
        let mut seen = self.seen.lock().unwrap();
        seen.push(request.clone());
        Ok(format!("reply {} to {}", seen.len(), request.prompt))
    }
}

async fn spawn_server(generator: Option<Arc<dyn TextGenerator>>) -> String {
    let store = Datastore::open_in_memory().await.unwrap();
    let app = create_router(AppState::new(generator, store));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn session_for(server_url: String) -> ChatSession<HttpChatClient> {
    let backend = HttpChatClient::new(&ClientConfig { server_url }).unwrap();
    let store = Datastore::open_in_memory().await.unwrap();
    let mut session = ChatSession::new(store, backend);
    session.load().await.unwrap();
    session
}

#[tokio::test]
async fn test_conversation_round_trip_through_server() {
    let generator = Arc::new(RecordingGenerator::default());
    let url = spawn_server(Some(Arc::clone(&generator) as Arc<dyn TextGenerator>)).await;
    let mut session = session_for(url).await;

    let first = session.send("What is Rust?").await.unwrap().unwrap();
    assert_eq!(first.sender, Sender::Bot);
    assert_eq!(first.content, "reply 1 to What is Rust?");
    assert_eq!(session.active_conversation().unwrap().title, "What is Rust?");

    let second = session.send("And Cargo?").await.unwrap().unwrap();
    assert_eq!(second.content, "reply 2 to And Cargo?");

    let contents: Vec<_> = session
        .messages()
        .iter()
        .map(|m| m.message.content.as_str())
        .collect();
    assert_eq!(
        contents,
        ["What is Rust?", "reply 1 to What is Rust?", "And Cargo?", "reply 2 to And Cargo?"]
    );
    assert!(session.messages().iter().all(|m| m.state == MessageState::Persisted));

    let seen = generator.seen.lock().unwrap();
    assert!(seen[0].history.is_empty());
    let roles: Vec<_> = seen[1].history.iter().map(|t| t.role).collect();
    assert_eq!(roles, [TurnRole::User, TurnRole::Model]);
    assert_eq!(seen[1].history[1].content, "reply 1 to What is Rust?");
}

#[tokio::test]
async fn test_missing_credential_surfaces_as_backend_error() {
    let url = spawn_server(None).await;
    let mut session = session_for(url).await;

    let err = session.send("hello?").await.unwrap_err();
    match err {
        SessionError::Backend { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "API key not configured");
        }
        other => panic!("unexpected error: {other}"),
    }

    // The user message was stored; no bot reply was added.
    assert_eq!(session.messages().len(), 1);
    assert_eq!(session.messages()[0].message.sender, Sender::User);
    assert_eq!(session.messages()[0].state, MessageState::Persisted);
}
