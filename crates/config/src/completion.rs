//! Completion service configuration.

use std::time::Duration;

use duration_str::deserialize_duration;
use secrecy::SecretString;
use serde::Deserialize;

/// Settings for the OpenAI-compatible completion service.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompletionConfig {
    /// API key for authentication. When absent, the binary falls back to `OPENAI_API_KEY`.
    pub api_key: Option<SecretString>,
    /// Custom base URL for the completion API.
    pub base_url: Option<String>,
    /// Model identifier sent with every request.
    pub model: String,
    /// Upper bound for connecting to the completion service and for each read from it.
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl CompletionConfig {
    /// Whether an API key has been configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}
