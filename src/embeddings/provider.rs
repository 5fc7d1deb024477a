use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Input of an embeddings request: one text or a list of texts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingInput {
    Single(String),
    Many(Vec<String>),
}

impl EmbeddingInput {
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(texts) => texts.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn texts(&self) -> Vec<&str> {
        match self {
            Self::Single(text) => vec![text.as_str()],
            Self::Many(texts) => texts.iter().map(String::as_str).collect(),
        }
    }
}

/// Wire request: `{model, input}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub input: EmbeddingInput,
}

/// Wire response: `{data: [{embedding, index}], usage: {total_tokens}}`.
///
/// `data` may arrive in any order; `index` refers to the input position.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub usage: EmbeddingUsage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingData {
    pub embedding: Vec<f32>,
    pub index: u32,
    /// Per-item token cost, when the provider reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EmbeddingUsage {
    #[serde(default)]
    pub total_tokens: u32,
}

/// Core trait for embedding providers
///
/// A provider performs exactly one remote call per request. Batching, delays,
/// truncation and re-ordering are handled by [`super::EmbeddingClient`].
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn create_embeddings(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse>;

    /// Get provider name for logging and metrics
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let single = EmbeddingRequest {
            model: "m".to_string(),
            input: EmbeddingInput::Single("hello".to_string()),
        };
        let json = serde_json::to_value(&single).unwrap();
        assert_eq!(json["input"], "hello");

        let many = EmbeddingRequest {
            model: "m".to_string(),
            input: EmbeddingInput::Many(vec!["a".to_string(), "b".to_string()]),
        };
        let json = serde_json::to_value(&many).unwrap();
        assert_eq!(json["input"].as_array().unwrap().len(), 2);
        assert_eq!(many.input.len(), 2);
    }

    #[test]
    fn test_response_parsing_tolerates_missing_usage() {
        let json = r#"{
            "data": [
                {"embedding": [0.4, 0.5], "index": 1},
                {"embedding": [0.1, 0.2], "index": 0}
            ]
        }"#;
        let response: EmbeddingResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.data.len(), 2);
        assert_eq!(response.data[0].index, 1);
        assert_eq!(response.usage.total_tokens, 0);
        assert!(response.model.is_none());
    }
}
