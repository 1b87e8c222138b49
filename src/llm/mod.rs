//! Generative-language provider access.
//!
//! The HTTP handler only sees [`TextGenerator`]; [`gemini::GeminiClient`] is
//! the production implementation.

pub mod error;
pub mod gemini;
pub mod types;

pub use error::{LlmError, LlmResult};
pub use gemini::GeminiClient;
pub use types::{GenerationRequest, Turn, TurnRole};

use async_trait::async_trait;

/// Something that turns a prompt (plus context) into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Model identifier, for logs.
    fn model_name(&self) -> &str;

    /// Generate a reply for the request.
    ///
    /// # Errors
    /// Returns an error if the provider call fails or yields no text.
    async fn generate(&self, request: &GenerationRequest) -> LlmResult<String>;
}
