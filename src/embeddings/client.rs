use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::metrics::{EMBEDDING_LATENCY, EMBEDDING_REQUESTS, EMBEDDING_TOKENS};

use super::config::EmbeddingsConfig;
use super::error::EmbeddingError;
use super::provider::{EmbeddingData, EmbeddingInput, EmbeddingProvider, EmbeddingRequest};

/// One embedding vector with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub model: String,
    pub tokens: u32,
}

impl Embedding {
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// Runtime settings of [`EmbeddingClient`].
#[derive(Debug, Clone)]
pub struct EmbeddingClientConfig {
    pub model: String,
    pub batch_size: usize,
    pub batch_delay: Duration,
    /// Inputs longer than this many characters are truncated (0 disables)
    pub max_input_chars: usize,
}

impl From<&EmbeddingsConfig> for EmbeddingClientConfig {
    fn from(config: &EmbeddingsConfig) -> Self {
        Self {
            model: config.model.clone(),
            batch_size: config.batch_size.max(1),
            batch_delay: config.batch_delay(),
            max_input_chars: config.max_input_chars(),
        }
    }
}

impl Default for EmbeddingClientConfig {
    fn default() -> Self {
        Self::from(&EmbeddingsConfig::default())
    }
}

/// Turns text into vectors through an [`EmbeddingProvider`].
///
/// Batches are sent sequentially with `batch_delay` between them, and results
/// come back in input order no matter how the provider orders its `data`.
#[derive(Clone)]
pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingProvider>,
    config: EmbeddingClientConfig,
}

impl EmbeddingClient {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: EmbeddingClientConfig) -> Self {
        Self { provider, config }
    }

    /// Build a client for the configured provider.
    pub fn from_config(config: &EmbeddingsConfig) -> Result<Self, EmbeddingError> {
        let provider = super::create_provider(config)?;
        Ok(Self::new(provider, EmbeddingClientConfig::from(config)))
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Embed a single text with one provider request.
    pub async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let input = EmbeddingInput::Single(self.truncate(text));
        let mut embeddings = self.request_batch(0, input).await?;

        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::MalformedResponse {
                batch_index: 0,
                batch_size: 1,
                message: "provider returned no embedding".to_string(),
            })
    }

    /// Embed many texts; output `i` corresponds to input `i`.
    ///
    /// A failing batch aborts the call; batches before it are discarded.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let batch_count = texts.len().div_ceil(self.config.batch_size);
        info!(
            texts = texts.len(),
            batches = batch_count,
            provider = self.provider.provider_name(),
            "Embedding texts"
        );

        let mut all_embeddings = Vec::with_capacity(texts.len());

        for (batch_index, batch) in texts.chunks(self.config.batch_size).enumerate() {
            if batch_index > 0 && !self.config.batch_delay.is_zero() {
                tokio::time::sleep(self.config.batch_delay).await;
            }

            let input = EmbeddingInput::Many(batch.iter().map(|t| self.truncate(t)).collect());
            let embeddings = self.request_batch(batch_index, input).await?;
            all_embeddings.extend(embeddings);
        }

        Ok(all_embeddings)
    }

    async fn request_batch(
        &self,
        batch_index: usize,
        input: EmbeddingInput,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        let batch_size = input.len();

        EMBEDDING_REQUESTS.inc();
        let start = Instant::now();

        debug!(batch_index, batch_size, "Requesting embeddings");

        let request = EmbeddingRequest {
            model: self.config.model.clone(),
            input,
        };

        let response = self
            .provider
            .create_embeddings(request)
            .await
            .map_err(|e| EmbeddingError::Request {
                batch_index,
                batch_size,
                message: format!("{:#}", e),
            })?;

        EMBEDDING_LATENCY.observe(start.elapsed().as_secs_f64());
        EMBEDDING_TOKENS.inc_by(f64::from(response.usage.total_tokens));

        let model = response
            .model
            .clone()
            .unwrap_or_else(|| self.config.model.clone());

        order_by_index(response.data, batch_size, response.usage.total_tokens, &model).map_err(
            |message| EmbeddingError::MalformedResponse {
                batch_index,
                batch_size,
                message,
            },
        )
    }

    fn truncate(&self, text: &str) -> String {
        let limit = self.config.max_input_chars;
        if limit == 0 || text.chars().count() <= limit {
            return text.to_string();
        }

        debug!(limit, "Truncating embedding input");
        text.chars().take(limit).collect()
    }
}

/// Place provider items at their declared input positions.
///
/// Token usage not reported per item is spread evenly over the batch.
fn order_by_index(
    data: Vec<EmbeddingData>,
    expected: usize,
    total_tokens: u32,
    model: &str,
) -> Result<Vec<Embedding>, String> {
    if data.len() != expected {
        return Err(format!(
            "expected {} embeddings, got {}",
            expected,
            data.len()
        ));
    }

    let mut slots: Vec<Option<EmbeddingData>> = (0..expected).map(|_| None).collect();
    let mut dimension = None;

    for item in data {
        let index = item.index as usize;
        if index >= expected {
            return Err(format!("index {} out of range", index));
        }
        if item.embedding.is_empty() {
            return Err(format!("empty embedding at index {}", index));
        }
        match dimension {
            None => dimension = Some(item.embedding.len()),
            Some(d) if d != item.embedding.len() => {
                return Err(format!(
                    "inconsistent dimension at index {}: {} vs {}",
                    index,
                    item.embedding.len(),
                    d
                ));
            }
            Some(_) => {}
        }
        if slots[index].is_some() {
            return Err(format!("duplicate index {}", index));
        }
        slots[index] = Some(item);
    }

    let count = expected as u32;
    let share = total_tokens / count.max(1);
    let remainder = total_tokens % count.max(1);

    Ok(slots
        .into_iter()
        .enumerate()
        .filter_map(|(i, slot)| {
            slot.map(|item| Embedding {
                tokens: item
                    .tokens
                    .unwrap_or(share + u32::from((i as u32) < remainder)),
                vector: item.embedding,
                model: model.to_string(),
            })
        })
        .collect())
}
