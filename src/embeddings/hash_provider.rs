use anyhow::Result;
use async_trait::async_trait;

use super::provider::{
    EmbeddingData, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, EmbeddingUsage,
};

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// 64-bit FNV-1a. Fixed across builds and toolchains, so stored vectors stay comparable.
fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Offline embedding provider based on feature hashing
///
/// Every lowercase word is hashed with FNV-1a into one of `dimension` buckets
/// with a hash-derived sign, then the vector is L2-normalized. Texts that share words
/// point in similar directions, which is enough for local use and tests.
pub struct HashEmbeddingProvider {
    dimension: usize,
}

impl HashEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn words(text: &str) -> impl Iterator<Item = &str> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
    }

    fn text_to_vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for word in Self::words(text) {
            let hash = fnv1a(word.to_lowercase().as_bytes());

            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for v in vector.iter_mut() {
                *v /= magnitude;
            }
        }

        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn create_embeddings(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        let mut total_tokens = 0u32;
        let data = request
            .input
            .texts()
            .into_iter()
            .enumerate()
            .map(|(index, text)| {
                let tokens = Self::words(text).count() as u32;
                total_tokens += tokens;
                EmbeddingData {
                    embedding: self.text_to_vector(text),
                    index: index as u32,
                    tokens: Some(tokens),
                }
            })
            .collect();

        Ok(EmbeddingResponse {
            data,
            model: Some(request.model),
            usage: EmbeddingUsage { total_tokens },
        })
    }

    fn provider_name(&self) -> &'static str {
        "hash"
    }
}
