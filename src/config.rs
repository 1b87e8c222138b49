//! Runtime configuration for the chat server and the terminal client.
//!
//! Everything is read from environment variables through a lookup closure,
//! so callers (and tests) can supply their own source.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Environment variable holding the provider credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Environment variable overriding the model name.
pub const MODEL_ENV: &str = "CHATBOT_MODEL";
/// Environment variable overriding the provider base URL.
pub const PROVIDER_URL_ENV: &str = "CHATBOT_GEMINI_URL";
/// Environment variable overriding the server port.
pub const PORT_ENV: &str = "CHATBOT_PORT";
/// Environment variable overriding the `SQLite` path.
pub const DB_PATH_ENV: &str = "CHATBOT_DB_PATH";
/// Environment variable pointing the terminal client at the server.
pub const SERVER_URL_ENV: &str = "CHATBOT_SERVER_URL";

/// Default Gemini model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
/// Default Gemini REST endpoint.
pub const DEFAULT_PROVIDER_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
/// Default server port.
pub const DEFAULT_PORT: u16 = 3000;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A value is out of range or malformed.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// A URL could not be parsed.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
}

/// Convenience result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Generative provider settings.
    pub provider: ProviderConfig,
    /// Datastore settings.
    pub storage: StorageConfig,
    /// Terminal client settings.
    pub client: ClientConfig,
}

impl AppConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    /// Returns an error if a variable is present but malformed.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unset or blank values fall back to defaults.
    ///
    /// # Errors
    /// Returns an error if a present value is malformed or validation fails.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(port) = get(PORT_ENV) {
            config.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("{PORT_ENV} is not a port: {port}")))?;
        }
        if let Some(key) = get(API_KEY_ENV) {
            config.provider = config.provider.with_api_key(key);
        }
        if let Some(model) = get(MODEL_ENV) {
            config.provider = config.provider.with_model(model);
        }
        if let Some(base_url) = get(PROVIDER_URL_ENV) {
            config.provider = config.provider.with_base_url(base_url);
        }
        if let Some(path) = get(DB_PATH_ENV) {
            config.storage.sqlite_path = PathBuf::from(path);
        }
        if let Some(server_url) = get(SERVER_URL_ENV) {
            config.client.server_url = server_url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be > 0".to_string()));
        }

        if self.provider.model.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "provider.model must not be empty".to_string(),
            ));
        }

        if self.storage.sqlite_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "storage.sqlite_path must not be empty".to_string(),
            ));
        }

        Url::parse(&self.provider.base_url)?;
        Url::parse(&self.client.server_url)?;

        Ok(())
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port bound on all interfaces.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT }
    }
}

/// Generative provider settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API credential; `None` means chat requests are refused.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Model name passed to `generateContent`.
    pub model: String,
    /// REST base URL, without trailing slash.
    pub base_url: String,
    /// Connect timeout.
    #[serde(with = "duration_serde")]
    pub connect_timeout: Duration,
    /// Whole-request timeout for long generations.
    #[serde(with = "duration_serde")]
    pub request_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_PROVIDER_URL.to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(120),
        }
    }
}

impl ProviderConfig {
    /// Set the API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Whether a usable credential is present.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// Datastore settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `SQLite` database file.
    pub sqlite_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("chatbot.sqlite3"),
        }
    }
}

/// Terminal client settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the chat server.
    pub server_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: format!("http://127.0.0.1:{DEFAULT_PORT}"),
        }
    }
}

/// Serde module for Duration serialization.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.provider.model, DEFAULT_MODEL);
        assert!(config.provider.api_key.is_none());
        assert!(!config.provider.has_api_key());
        assert_eq!(config.client.server_url, "http://127.0.0.1:3000");
    }

    #[test]
    fn test_environment_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (API_KEY_ENV, "secret"),
            (MODEL_ENV, "gemini-2.0-flash"),
            (PORT_ENV, "8080"),
            (DB_PATH_ENV, "/tmp/chat.db"),
            (SERVER_URL_ENV, "http://chat.local:8080"),
        ]))
        .unwrap();

        assert_eq!(config.provider.api_key.as_deref(), Some("secret"));
        assert!(config.provider.has_api_key());
        assert_eq!(config.provider.model, "gemini-2.0-flash");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.sqlite_path, PathBuf::from("/tmp/chat.db"));
        assert_eq!(config.client.server_url, "http://chat.local:8080");
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = AppConfig::from_lookup(lookup(&[(API_KEY_ENV, "   ")])).unwrap();
        assert!(config.provider.api_key.is_none());
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(AppConfig::from_lookup(lookup(&[(PORT_ENV, "not-a-port")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[(PORT_ENV, "0")])).is_err());
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = AppConfig::from_lookup(lookup(&[(PROVIDER_URL_ENV, "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::Url(_)));
    }

    #[test]
    fn test_provider_builder() {
        let provider = ProviderConfig::default()
            .with_api_key("k")
            .with_model("m")
            .with_base_url("http://localhost:1");
        assert_eq!(provider.api_key.as_deref(), Some("k"));
        assert_eq!(provider.model, "m");
        assert_eq!(provider.base_url, "http://localhost:1");
    }
}
