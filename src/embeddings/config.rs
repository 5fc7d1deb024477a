use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::EmbeddingError;

/// Provider type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// OpenAI-compatible embeddings API
    #[default]
    OpenAI,
    /// Deterministic feature-hashing embeddings, no network access
    Hash,
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAI => write!(f, "openai"),
            Self::Hash => write!(f, "hash"),
        }
    }
}

/// Embedding provider and client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default)]
    pub provider: ProviderType,

    #[serde(default = "default_model")]
    pub model: String,

    /// API key (can be environment variable reference like ${OPENAI_API_KEY})
    #[serde(default)]
    pub api_key: String,

    /// For Azure or custom endpoints
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Vector length produced by the hash provider
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Items per provider request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Pause between consecutive batch requests
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    /// Model input limit in tokens
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,

    /// Rough characters-per-token ratio used for truncation
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            provider: ProviderType::default(),
            model: default_model(),
            api_key: String::new(),
            base_url: None,
            dimension: default_dimension(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            max_input_tokens: default_max_input_tokens(),
            chars_per_token: default_chars_per_token(),
        }
    }
}

fn default_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_dimension() -> usize {
    1536
}

fn default_batch_size() -> usize {
    20
}

fn default_batch_delay_ms() -> u64 {
    100
}

fn default_max_input_tokens() -> usize {
    8191
}

fn default_chars_per_token() -> usize {
    4
}

impl EmbeddingsConfig {
    /// Resolve the API key.
    ///
    /// Priority: explicit key, then `${VAR}` reference, then `OPENAI_API_KEY`.
    pub fn load_api_key(&self) -> Result<String, EmbeddingError> {
        if !self.api_key.is_empty() && !self.api_key.starts_with("${") {
            return Ok(self.api_key.clone());
        }

        if self.api_key.starts_with("${") && self.api_key.ends_with('}') {
            let var_name = &self.api_key[2..self.api_key.len() - 1];
            return std::env::var(var_name).map_err(|_| {
                EmbeddingError::MissingCredentials(format!(
                    "environment variable {} not set",
                    var_name
                ))
            });
        }

        std::env::var("OPENAI_API_KEY").map_err(|_| {
            EmbeddingError::MissingCredentials(
                "no api_key configured and OPENAI_API_KEY environment variable not set".to_string(),
            )
        })
    }

    /// Character budget for a single input.
    pub fn max_input_chars(&self) -> usize {
        self.max_input_tokens.saturating_mul(self.chars_per_token)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}
