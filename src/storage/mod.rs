//! Read access to documents and chunks.
//!
//! The search layer only reads through [`DocumentStore`]; writes happen in
//! ingestion code against a concrete store.

mod memory;
mod snapshot;

pub use memory::InMemoryStore;
pub use snapshot::Snapshot;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::{Chunk, Document};

/// Restricts reads to one owning scope, or to everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeFilter {
    pub scope_id: Option<String>,
}

impl ScopeFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn scope(scope_id: impl Into<String>) -> Self {
        Self {
            scope_id: Some(scope_id.into()),
        }
    }

    pub fn matches(&self, scope_id: Option<&str>) -> bool {
        match &self.scope_id {
            None => true,
            Some(wanted) => scope_id == Some(wanted.as_str()),
        }
    }
}

/// Committed, read-only view of the corpus.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Active documents in scope, in a stable order.
    async fn list_active_documents(&self, filter: &ScopeFilter) -> Result<Vec<Document>>;

    /// Chunks in scope that carry a stored embedding.
    async fn list_chunks_with_embeddings(&self, filter: &ScopeFilter) -> Result<Vec<Chunk>>;

    async fn get_document(&self, id: &str) -> Result<Option<Document>>;
}
