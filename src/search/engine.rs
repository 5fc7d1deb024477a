use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use super::error::SearchError;
use super::hybrid::{HybridSearch, RrfFusion};
use super::keyword::KeywordSearch;
use super::similar::{SimilarOptions, SimilarityLookup};
use super::traits::{Search, SearchQuery};
use super::types::SearchResult;
use super::vector::{VectorSearch, VectorSearchOptions};
use crate::config::{SearchConfig, SearchMode};
use crate::embeddings::{codec, EmbeddingClient};
use crate::metrics::{SEARCH_LATENCY, SEARCH_REQUESTS, SEARCH_RESULTS};
use crate::storage::{DocumentStore, ScopeFilter};
use crate::text::TextFlattener;

/// Caller-facing query: `{query, scopeId?, limit?}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub scope_id: Option<String>,
    /// Falls back to the configured default limit
    pub limit: Option<usize>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }
}

/// Whether semantic search is worth offering for a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    pub available: bool,
    pub embedded_count: usize,
    pub total_count: usize,
}

/// Vector and hybrid search, present once an embedding client is attached.
struct SemanticSearch {
    vector: Arc<VectorSearch>,
    hybrid: HybridSearch,
}

/// Entry point for all query paths over one store.
///
/// Keyword search and similarity lookup work on stored data alone; vector and
/// hybrid modes need [`SearchEngine::with_embeddings`].
pub struct SearchEngine {
    store: Arc<dyn DocumentStore>,
    flattener: Arc<dyn TextFlattener>,
    keyword: Arc<KeywordSearch>,
    semantic: Option<SemanticSearch>,
    similar: SimilarityLookup,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        flattener: Arc<dyn TextFlattener>,
        config: SearchConfig,
    ) -> Self {
        let keyword = Arc::new(KeywordSearch::new(
            store.clone(),
            flattener.clone(),
            config.excerpt_chars,
        ));
        let similar = SimilarityLookup::new(
            store.clone(),
            keyword.clone(),
            flattener.clone(),
            config.excerpt_chars,
        );

        Self {
            store,
            flattener,
            keyword,
            semantic: None,
            similar,
            config,
        }
    }

    /// Enable vector and hybrid search through `client`.
    pub fn with_embeddings(mut self, client: Arc<EmbeddingClient>) -> Self {
        let vector = Arc::new(VectorSearch::new(
            self.store.clone(),
            client,
            self.flattener.clone(),
            VectorSearchOptions::from(&self.config),
        ));
        let hybrid = HybridSearch::new(
            vector.clone(),
            self.keyword.clone(),
            RrfFusion::new(self.config.vector_weight, self.config.rrf_k),
        );

        self.semantic = Some(SemanticSearch { vector, hybrid });
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn searcher(&self, mode: SearchMode) -> Result<&dyn Search, SearchError> {
        match (mode, &self.semantic) {
            (SearchMode::Keyword, _) => Ok(self.keyword.as_ref()),
            (SearchMode::Vector, Some(semantic)) => Ok(semantic.vector.as_ref()),
            (SearchMode::Hybrid, Some(semantic)) => Ok(&semantic.hybrid),
            (mode, None) => Err(SearchError::SemanticUnavailable(mode.to_string())),
        }
    }

    /// Run a query in the given mode.
    pub async fn search(
        &self,
        request: &SearchRequest,
        mode: SearchMode,
    ) -> Result<Vec<SearchResult>> {
        SEARCH_REQUESTS.inc();
        let start = Instant::now();

        let query = SearchQuery::new(
            request.query.clone(),
            request.limit.unwrap_or(self.config.default_limit),
        )
        .with_scope(request.scope_id.clone());

        let searcher = self.searcher(mode)?;
        let results = searcher
            .search(&query)
            .await
            .with_context(|| format!("{} search failed", searcher.search_type()))?;

        let elapsed = start.elapsed();
        SEARCH_LATENCY.observe(elapsed.as_secs_f64());
        SEARCH_RESULTS.observe(results.len() as f64);

        info!(
            search_type = searcher.search_type(),
            query = %request.query,
            results = results.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Search completed"
        );

        Ok(results)
    }

    /// Documents related to `document_id`; see [`SimilarityLookup`].
    pub async fn find_similar(
        &self,
        document_id: &str,
        options: &SimilarOptions,
    ) -> Result<Vec<SearchResult>> {
        self.similar.find_similar(document_id, options).await
    }

    /// Similarity options from the configuration.
    pub fn similar_options(&self) -> SimilarOptions {
        SimilarOptions::from(&self.config)
    }

    /// Count active documents in scope and how many carry a usable embedding.
    pub async fn availability(&self, filter: &ScopeFilter) -> Result<Availability> {
        probe_availability(self.store.as_ref(), filter).await
    }
}

/// Scan the active documents in scope for usable embeddings.
pub async fn probe_availability(
    store: &dyn DocumentStore,
    filter: &ScopeFilter,
) -> Result<Availability> {
    let documents = store
        .list_active_documents(filter)
        .await
        .with_context(|| "Failed to list documents for availability check")?;

    let embedded_count = documents
        .iter()
        .filter(|doc| codec::parse(doc.embedding.as_deref()).is_some())
        .count();

    Ok(Availability {
        available: embedded_count > 0,
        embedded_count,
        total_count: documents.len(),
    })
}
