//! Application state shared across all request handlers.

use std::sync::Arc;

use crate::config::AppConfig;
use crate::llm::{GeminiClient, TextGenerator};
use crate::store::Datastore;

/// Shared application state.
pub struct AppState {
    /// Text generator; `None` when no credential is configured.
    pub generator: Option<Arc<dyn TextGenerator>>,
    /// Conversation datastore.
    pub store: Datastore,
}

impl AppState {
    /// Create a new application state from parts.
    #[must_use]
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, store: Datastore) -> Arc<Self> {
        Arc::new(Self { generator, store })
    }

    /// Build state from configuration: Gemini client plus the `SQLite` datastore.
    ///
    /// A missing credential is not fatal; chat requests are refused instead.
    ///
    /// # Errors
    /// Returns an error if the HTTP client or the datastore cannot be created.
    pub async fn from_config(
        config: &AppConfig,
    ) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let generator: Option<Arc<dyn TextGenerator>> = if config.provider.has_api_key() {
            let client = GeminiClient::new(&config.provider)
                .map_err(|e| format!("Failed to create Gemini client: {e}"))?;
            tracing::info!("Model: {}", client.model_name());
            Some(Arc::new(client))
        } else {
            tracing::warn!(
                "{} is not set; /api/chat will answer 500",
                crate::config::API_KEY_ENV
            );
            None
        };

        let store = Datastore::open(&config.storage)
            .await
            .map_err(|e| format!("Failed to open datastore: {e}"))?;

        Ok(Self::new(generator, store))
    }
}
