//! Search trait for polymorphic search implementations.
//!
//! Vector, keyword and hybrid search all implement [`Search`], so hybrid
//! search can combine any two branches.

use anyhow::Result;
use async_trait::async_trait;

use super::types::SearchResult;
use crate::storage::ScopeFilter;

/// A resolved query passed to a [`Search`] implementation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub scope_id: Option<String>,
    pub limit: usize,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, limit: usize) -> Self {
        Self {
            text: text.into(),
            scope_id: None,
            limit,
        }
    }

    pub fn with_scope(mut self, scope_id: Option<String>) -> Self {
        self.scope_id = scope_id;
        self
    }

    pub fn with_limit(&self, limit: usize) -> Self {
        Self {
            limit,
            ..self.clone()
        }
    }

    pub fn scope_filter(&self) -> ScopeFilter {
        ScopeFilter {
            scope_id: self.scope_id.clone(),
        }
    }
}

/// Common trait for all search implementations.
#[async_trait]
pub trait Search: Send + Sync {
    /// Search for relevant documents and chunks.
    ///
    /// Returns at most `query.limit` results sorted by relevance (highest
    /// score first).
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>>;

    /// Get the search type identifier ("vector", "keyword", "hybrid").
    fn search_type(&self) -> &'static str;
}
