//! Gemini `generateContent` client.
//!
//! Behaviour:
//! - `POST {base}/models/{model}:generateContent` with the key in `x-goog-api-key`.
//! - History turns are sent before the new prompt, roles `user` / `model`.
//! - The reply is the concatenated text parts of the first candidate.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;

use super::error::{LlmError, LlmResult};
use super::types::{GenerationRequest, TurnRole};
use super::TextGenerator;

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Option<Vec<GeminiCandidate>>,
    #[serde(default)]
    error: Option<GeminiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Async Gemini client bound to one model.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    /// Build a client from provider settings.
    ///
    /// # Errors
    /// Returns [`LlmError::MissingApiKey`] without a credential, or an HTTP
    /// error if the client cannot be built.
    pub fn new(config: &ProviderConfig) -> LlmResult<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::MissingApiKey)?
            .to_string();

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn build_contents(request: &GenerationRequest) -> Vec<GeminiContent> {
        request
            .history
            .iter()
            .map(|turn| (turn.role, turn.content.as_str()))
            .chain(std::iter::once((TurnRole::User, request.prompt.as_str())))
            .map(|(role, text)| GeminiContent {
                role: Some(role.as_str().to_string()),
                parts: vec![GeminiPart {
                    text: Some(text.to_string()),
                }],
            })
            .collect()
    }

    /// Pull a readable message out of a Gemini error body.
    fn parse_error_message(body: &str) -> String {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(ToString::to_string))
            .unwrap_or_else(|| "request failed".to_string())
    }

    fn extract_text(response: GeminiResponse) -> LlmResult<String> {
        if let Some(error) = response.error {
            return Err(LlmError::Provider(
                error.message.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        let text: String = response
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &GenerationRequest) -> LlmResult<String> {
        let body = GeminiRequest {
            contents: Self::build_contents(request),
        };

        tracing::debug!(
            model = %self.model,
            history = request.history.len(),
            "sending generateContent request"
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                message: Self::parse_error_message(&text),
            });
        }

        let parsed: GeminiResponse = response.json().await?;
        Self::extract_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::*;
    use crate::llm::types::Turn;

    async fn spawn_provider(router: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    fn config_for(addr: SocketAddr) -> ProviderConfig {
        ProviderConfig::default()
            .with_api_key("test-key")
            .with_base_url(format!("http://{addr}/v1beta/"))
    }

    #[test]
    fn test_new_requires_api_key() {
        let err = GeminiClient::new(&ProviderConfig::default()).err().unwrap();
        assert!(matches!(err, LlmError::MissingApiKey));

        let blank = ProviderConfig::default().with_api_key("  ");
        assert!(matches!(GeminiClient::new(&blank), Err(LlmError::MissingApiKey)));
    }

    #[test]
    fn test_contents_put_history_before_prompt() {
        let request = GenerationRequest::new("third")
            .with_history(vec![Turn::user("first"), Turn::model("second")]);
        let contents = GeminiClient::build_contents(&request);
        let roles: Vec<_> = contents.iter().map(|c| c.role.clone().unwrap()).collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
        assert_eq!(contents[2].parts[0].text.as_deref(), Some("third"));
    }

    #[test]
    fn test_extract_text_joins_parts() {
        let response: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": "Hello, "}, {"text": "world"}]}}]
        }))
        .unwrap();
        assert_eq!(GeminiClient::extract_text(response).unwrap(), "Hello, world");
    }

    #[test]
    fn test_extract_text_rejects_empty_and_missing() {
        let empty: GeminiResponse =
            serde_json::from_value(json!({"candidates": [{"content": {"parts": [{"text": ""}]}}]}))
                .unwrap();
        assert!(matches!(GeminiClient::extract_text(empty), Err(LlmError::EmptyResponse)));

        let spaces: GeminiResponse =
            serde_json::from_value(json!({"candidates": [{"content": {"parts": [{"text": "  "}]}}]}))
                .unwrap();
        assert_eq!(GeminiClient::extract_text(spaces).unwrap(), "  ");

        let blocked: GeminiResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert!(matches!(GeminiClient::extract_text(blocked), Err(LlmError::EmptyResponse)));
    }

    #[tokio::test]
    async fn test_generate_against_local_provider() {
        let router = Router::new().route(
            "/v1beta/models/{call}",
            post(|Path(call): Path<String>, headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(call, "gemini-1.5-flash:generateContent");
                assert_eq!(headers["x-goog-api-key"], "test-key");
                let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default().to_string();
                Json(json!({
                    "candidates": [{"content": {"role": "model", "parts": [{"text": format!("echo: {prompt}")}]}}]
                }))
            }),
        );
        let addr = spawn_provider(router).await;

        let client = GeminiClient::new(&config_for(addr)).unwrap();
        let reply = client.generate(&GenerationRequest::new("ping")).await.unwrap();
        assert_eq!(reply, "echo: ping");
        assert_eq!(client.model_name(), "gemini-1.5-flash");
    }

    #[tokio::test]
    async fn test_generate_maps_error_status() {
        let router = Router::new().route(
            "/v1beta/models/{call}",
            post(|| async {
                (
                    AxumStatus::BAD_REQUEST,
                    Json(json!({"error": {"code": 400, "message": "API key not valid"}})),
                )
            }),
        );
        let addr = spawn_provider(router).await;

        let client = GeminiClient::new(&config_for(addr)).unwrap();
        let err = client.generate(&GenerationRequest::new("ping")).await.unwrap_err();
        match err {
            LlmError::Status { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
