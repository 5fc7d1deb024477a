use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{DocumentStore, ScopeFilter, Snapshot};
use crate::model::{Chunk, Document};

/// Document store held in memory, ordered by document id.
#[derive(Default)]
pub struct InMemoryStore {
    documents: RwLock<BTreeMap<String, Document>>,
    chunks: RwLock<BTreeMap<String, Vec<Chunk>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut chunks: BTreeMap<String, Vec<Chunk>> = BTreeMap::new();
        for chunk in snapshot.chunks {
            chunks
                .entry(chunk.document_id.clone())
                .or_default()
                .push(chunk);
        }

        let documents = snapshot
            .documents
            .into_iter()
            .map(|doc| (doc.id.clone(), doc))
            .collect();

        Self {
            documents: RwLock::new(documents),
            chunks: RwLock::new(chunks),
        }
    }

    pub async fn snapshot(&self) -> Snapshot {
        let documents = self.documents.read().await.values().cloned().collect();
        let chunks = self
            .chunks
            .read()
            .await
            .values()
            .flatten()
            .cloned()
            .collect();

        Snapshot { documents, chunks }
    }

    /// Insert or replace a document.
    pub async fn upsert_document(&self, document: Document) {
        self.documents
            .write()
            .await
            .insert(document.id.clone(), document);
    }

    /// Replace every chunk of a document.
    pub async fn replace_chunks(&self, document_id: &str, chunks: Vec<Chunk>) {
        let mut all = self.chunks.write().await;
        if chunks.is_empty() {
            all.remove(document_id);
        } else {
            all.insert(document_id.to_string(), chunks);
        }
    }

    /// Remove a document and its chunks. Returns whether it existed.
    pub async fn remove_document(&self, id: &str) -> bool {
        self.chunks.write().await.remove(id);
        self.documents.write().await.remove(id).is_some()
    }

    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn chunk_count(&self) -> usize {
        self.chunks.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn list_active_documents(&self, filter: &ScopeFilter) -> Result<Vec<Document>> {
        Ok(self
            .documents
            .read()
            .await
            .values()
            .filter(|doc| doc.is_active() && filter.matches(doc.scope_id.as_deref()))
            .cloned()
            .collect())
    }

    async fn list_chunks_with_embeddings(&self, filter: &ScopeFilter) -> Result<Vec<Chunk>> {
        Ok(self
            .chunks
            .read()
            .await
            .values()
            .flatten()
            .filter(|chunk| chunk.embedding.is_some() && filter.matches(chunk.scope_id.as_deref()))
            .cloned()
            .collect())
    }

    async fn get_document(&self, id: &str) -> Result<Option<Document>> {
        Ok(self.documents.read().await.get(id).cloned())
    }
}
