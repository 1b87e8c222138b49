//! Client side of `POST /api/chat`.

use async_trait::async_trait;
use reqwest::Client;

use crate::config::ClientConfig;
use crate::server::models::{ChatRequest, ChatResponse, ErrorBody};

use super::error::{SessionError, SessionResult};

/// Whatever answers chat messages for a session.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one message (with history) and return the reply text.
    ///
    /// # Errors
    /// Returns an error if the call fails or the server reports an error.
    async fn reply(&self, request: &ChatRequest) -> SessionResult<String>;
}

/// [`ChatBackend`] that talks to a running chat server.
pub struct HttpChatClient {
    client: Client,
    endpoint: String,
}

impl HttpChatClient {
    /// Build a client for the configured server.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> SessionResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/api/chat", config.server_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl ChatBackend for HttpChatClient {
    async fn reply(&self, request: &ChatRequest) -> SessionResult<String> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.error)
                .unwrap_or_else(|_| "request failed".to_string());
            return Err(SessionError::Backend {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response.json().await?;
        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;
    use crate::server::models::HistoryTurn;

    async fn spawn(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn client_for(addr: SocketAddr) -> HttpChatClient {
        HttpChatClient::new(&ClientConfig {
            server_url: format!("http://{addr}/"),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_reply_reads_response_field() {
        let router = Router::new().route(
            "/api/chat",
            post(|Json(body): Json<ChatRequest>| async move {
                Json(json!({"response": format!("{}|{}", body.message, body.history.len())}))
            }),
        );
        let client = client_for(spawn(router).await);

        let request = ChatRequest {
            message: "hi".to_string(),
            history: vec![HistoryTurn {
                role: "user".to_string(),
                content: "earlier".to_string(),
            }],
        };
        assert_eq!(client.reply(&request).await.unwrap(), "hi|1");
    }

    #[tokio::test]
    async fn test_reply_surfaces_error_envelope() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "API key not configured"})),
                )
            }),
        );
        let client = client_for(spawn(router).await);

        let request = ChatRequest {
            message: "hi".to_string(),
            history: Vec::new(),
        };
        match client.reply(&request).await.unwrap_err() {
            SessionError::Backend { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "API key not configured");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
