use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::similarity::cosine_similarity;
use super::traits::{Search, SearchQuery};
use super::types::{excerpt, sort_by_similarity, SearchResult};
use crate::config::SearchConfig;
use crate::embeddings::{codec, EmbeddingClient};
use crate::model::Document;
use crate::storage::DocumentStore;
use crate::text::TextFlattener;

/// Tuning for [`VectorSearch`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorSearchOptions {
    pub min_similarity: f32,
    pub include_chunks: bool,
    pub excerpt_chars: usize,
}

impl Default for VectorSearchOptions {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for VectorSearchOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            min_similarity: config.min_similarity,
            include_chunks: config.include_chunks,
            excerpt_chars: config.excerpt_chars,
        }
    }
}

/// Semantic search over stored document and chunk embeddings.
///
/// The query is embedded once and compared against every embedded document
/// (and chunk) in scope. Each document appears at most once in the output,
/// represented by its best-scoring hit.
pub struct VectorSearch {
    store: Arc<dyn DocumentStore>,
    client: Arc<EmbeddingClient>,
    flattener: Arc<dyn TextFlattener>,
    options: VectorSearchOptions,
}

impl VectorSearch {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        client: Arc<EmbeddingClient>,
        flattener: Arc<dyn TextFlattener>,
        options: VectorSearchOptions,
    ) -> Self {
        Self {
            store,
            client,
            flattener,
            options,
        }
    }

    pub fn options(&self) -> &VectorSearchOptions {
        &self.options
    }

    fn score_documents(
        &self,
        query_vector: &[f32],
        documents: &[Document],
    ) -> Result<Vec<SearchResult>> {
        let mut results = Vec::new();

        for document in documents {
            let Some(vector) = codec::parse(document.embedding.as_deref()) else {
                continue;
            };

            let similarity = cosine_similarity(query_vector, &vector)
                .with_context(|| format!("Failed to score document {}", document.id))?;
            if similarity < self.options.min_similarity {
                continue;
            }

            let body = document.resolve_body(self.flattener.as_ref());
            results.push(SearchResult::for_document(
                document,
                excerpt(document, &body, self.options.excerpt_chars),
                similarity,
            ));
        }

        Ok(results)
    }

    async fn score_chunks(
        &self,
        query: &SearchQuery,
        query_vector: &[f32],
        documents: &[Document],
    ) -> Result<Vec<SearchResult>> {
        let chunks = self
            .store
            .list_chunks_with_embeddings(&query.scope_filter())
            .await
            .with_context(|| "Failed to list chunks for vector search")?;

        // Only chunks of active documents are eligible
        let titles: HashMap<&str, &str> = documents
            .iter()
            .map(|doc| (doc.id.as_str(), doc.title.as_str()))
            .collect();

        let mut results = Vec::new();
        for chunk in &chunks {
            let Some(title) = titles.get(chunk.document_id.as_str()) else {
                continue;
            };
            let Some(vector) = codec::parse(chunk.embedding.as_deref()) else {
                continue;
            };

            let similarity = cosine_similarity(query_vector, &vector)
                .with_context(|| format!("Failed to score chunk {}", chunk.id))?;
            if similarity >= self.options.min_similarity {
                results.push(SearchResult::for_chunk(chunk, title, similarity));
            }
        }

        sort_by_similarity(&mut results);
        results.truncate(query.limit.saturating_mul(2));

        Ok(results)
    }
}

/// Keep the first (best) result per document.
pub(crate) fn dedup_by_document(results: Vec<SearchResult>) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    results
        .into_iter()
        .filter(|result| seen.insert(result.document_id.clone()))
        .collect()
}

#[async_trait]
impl Search for VectorSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        if query.limit == 0 {
            return Ok(Vec::new());
        }

        let start = Instant::now();

        let query_embedding = self
            .client
            .embed(&query.text)
            .await
            .with_context(|| format!("Failed to embed query: {}", query.text))?;

        debug!(
            dimension = query_embedding.dimension(),
            "Generated query embedding"
        );

        let documents = self
            .store
            .list_active_documents(&query.scope_filter())
            .await
            .with_context(|| "Failed to list documents for vector search")?;

        let mut results = self.score_documents(&query_embedding.vector, &documents)?;

        if self.options.include_chunks {
            let chunk_results = self
                .score_chunks(query, &query_embedding.vector, &documents)
                .await?;
            results.extend(chunk_results);
        }

        sort_by_similarity(&mut results);
        let mut results = dedup_by_document(results);
        results.truncate(query.limit);

        info!(
            search_type = "vector",
            query = %query.text,
            results = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Vector search completed"
        );

        Ok(results)
    }

    fn search_type(&self) -> &'static str {
        "vector"
    }
}
