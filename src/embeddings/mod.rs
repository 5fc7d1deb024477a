mod client;
pub mod codec;
mod config;
mod error;
mod hash_provider;
mod openai_provider;
mod provider;

// Re-export public interfaces
pub use client::{Embedding, EmbeddingClient, EmbeddingClientConfig};
pub use config::{EmbeddingsConfig, ProviderType};
pub use error::EmbeddingError;
pub use hash_provider::HashEmbeddingProvider;
pub use openai_provider::OpenAIProvider;
pub use provider::{
    EmbeddingData, EmbeddingInput, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse,
    EmbeddingUsage,
};

use std::sync::Arc;

/// Create the provider selected in the configuration.
pub fn create_provider(
    config: &EmbeddingsConfig,
) -> Result<Arc<dyn EmbeddingProvider>, EmbeddingError> {
    Ok(match config.provider {
        ProviderType::OpenAI => Arc::new(OpenAIProvider::new(config)?),
        ProviderType::Hash => Arc::new(HashEmbeddingProvider::new(config.dimension)),
    })
}
