use anyhow::{Context, Result};
use async_openai::{
    config::OpenAIConfig as AsyncOpenAIConfig, types::CreateEmbeddingRequestArgs, Client,
};
use async_trait::async_trait;
use tracing::info;

use super::config::EmbeddingsConfig;
use super::error::EmbeddingError;
use super::provider::{
    EmbeddingData, EmbeddingInput, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse,
    EmbeddingUsage,
};

/// OpenAI-compatible embeddings provider
///
/// One HTTP call per request, no retries. A non-success status surfaces as an
/// error which the client tags with the batch it belonged to.
pub struct OpenAIProvider {
    client: Client<AsyncOpenAIConfig>,
}

impl OpenAIProvider {
    pub fn new(config: &EmbeddingsConfig) -> Result<Self, EmbeddingError> {
        let api_key = config.load_api_key()?;

        let mut openai_config = AsyncOpenAIConfig::new().with_api_key(api_key);

        if let Some(base_url) = &config.base_url {
            openai_config = openai_config.with_api_base(base_url);
        }

        info!(model = %config.model, "Initialized OpenAI embedding provider");

        Ok(Self {
            client: Client::with_config(openai_config),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIProvider {
    async fn create_embeddings(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let builder = match request.input {
            EmbeddingInput::Single(text) => CreateEmbeddingRequestArgs::default()
                .model(request.model)
                .input(text)
                .build(),
            EmbeddingInput::Many(texts) => CreateEmbeddingRequestArgs::default()
                .model(request.model)
                .input(texts)
                .build(),
        };
        let args = builder.context("Failed to build OpenAI embedding request")?;

        let response = self
            .client
            .embeddings()
            .create(args)
            .await
            .context("OpenAI API request failed")?;

        Ok(EmbeddingResponse {
            model: Some(response.model),
            usage: EmbeddingUsage {
                total_tokens: response.usage.total_tokens,
            },
            data: response
                .data
                .into_iter()
                .map(|item| EmbeddingData {
                    embedding: item.embedding,
                    index: item.index,
                    tokens: None,
                })
                .collect(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
