use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use docrag::embeddings::{
    EmbeddingData, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, EmbeddingUsage,
};
use docrag::search::{Search, SearchQuery, SearchResult};

/// Words that put a text on one axis; anything else lands on the last axis.
const TOPICS: [&[&str]; 2] = [
    &["budget", "marketing", "spend"],
    &["hiring", "interview", "candidate"],
];

pub const TOPIC_DIMENSION: usize = TOPICS.len() + 1;

/// One-hot vector for the first topic mentioned in `text`.
pub fn topic_vector(text: &str) -> Vec<f32> {
    let text = text.to_lowercase();
    let axis = TOPICS
        .iter()
        .position(|words| words.iter().any(|word| text.contains(word)))
        .unwrap_or(TOPICS.len());

    let mut vector = vec![0.0; TOPIC_DIMENSION];
    vector[axis] = 1.0;
    vector
}

/// Provider returning topic vectors in reverse order, with a failure switch.
#[derive(Default)]
pub struct TopicProvider {
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl TopicProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for TopicProvider {
    async fn create_embeddings(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(anyhow!("status 503: provider unavailable"));
        }

        let texts = request.input.texts();
        let data = texts
            .iter()
            .enumerate()
            .rev()
            .map(|(index, text)| EmbeddingData {
                embedding: topic_vector(text),
                index: index as u32,
                tokens: None,
            })
            .collect();

        Ok(EmbeddingResponse {
            data,
            model: Some(request.model),
            usage: EmbeddingUsage {
                total_tokens: 3 * texts.len() as u32,
            },
        })
    }

    fn provider_name(&self) -> &'static str {
        "topic"
    }
}

/// Search branch that always fails.
pub struct FailingSearch;

#[async_trait]
impl Search for FailingSearch {
    async fn search(&self, _query: &SearchQuery) -> Result<Vec<SearchResult>> {
        Err(anyhow!("branch offline"))
    }

    fn search_type(&self) -> &'static str {
        "failing"
    }
}
