//! Ingestion: flatten, chunk and embed documents.
//!
//! The pipeline does not decide when a document needs re-embedding; callers
//! hand it the documents whose text changed.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use super::chunker::Chunker;
use crate::embeddings::{codec, EmbeddingClient};
use crate::model::{Chunk, Document};
use crate::storage::InMemoryStore;
use crate::text::TextFlattener;

/// A document with its body resolved, its chunks and their embeddings.
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    pub document: Document,
    pub chunks: Vec<Chunk>,
}

/// Counts for one indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexingReport {
    pub documents_indexed: usize,
    pub chunks_created: usize,
    pub chunks_embedded: usize,
    pub total_tokens: u64,
}

impl IndexingReport {
    /// Merge another report into this one
    pub fn merge(&mut self, other: &IndexingReport) {
        self.documents_indexed += other.documents_indexed;
        self.chunks_created += other.chunks_created;
        self.chunks_embedded += other.chunks_embedded;
        self.total_tokens += other.total_tokens;
    }

    pub fn summary(&self) -> String {
        format!(
            "Indexed {} documents, created {} chunks ({} embedded), {} tokens",
            self.documents_indexed, self.chunks_created, self.chunks_embedded, self.total_tokens
        )
    }
}

pub struct IndexingPipeline {
    chunker: Chunker,
    client: Arc<EmbeddingClient>,
    flattener: Arc<dyn TextFlattener>,
}

impl IndexingPipeline {
    pub fn new(
        chunker: Chunker,
        client: Arc<EmbeddingClient>,
        flattener: Arc<dyn TextFlattener>,
    ) -> Self {
        Self {
            chunker,
            client,
            flattener,
        }
    }

    /// Resolve the body and chunk it. No provider calls.
    pub fn prepare(&self, mut document: Document) -> IndexedDocument {
        if document.body.is_none() {
            let body = document.resolve_body(self.flattener.as_ref()).into_owned();
            document.body = Some(body);
        }

        let chunks = self.chunker.chunk(&document);
        IndexedDocument { document, chunks }
    }

    /// Chunk and embed `documents`.
    ///
    /// Document and chunk texts go through a single `embed_batch` call, so a
    /// provider failure leaves every document of this call unembedded.
    pub async fn index_documents(
        &self,
        documents: Vec<Document>,
    ) -> Result<(Vec<IndexedDocument>, IndexingReport)> {
        let start = Instant::now();
        let mut indexed: Vec<IndexedDocument> =
            documents.into_iter().map(|doc| self.prepare(doc)).collect();

        let mut texts: Vec<String> = indexed
            .iter()
            .map(|item| {
                let body = item.document.body.as_deref().unwrap_or("");
                item.document.embedding_text(body)
            })
            .collect();

        // Blank chunks (empty documents) stay unembedded
        let mut chunk_slots = Vec::new();
        for (doc_index, item) in indexed.iter().enumerate() {
            for (chunk_index, chunk) in item.chunks.iter().enumerate() {
                if !chunk.content.trim().is_empty() {
                    chunk_slots.push((doc_index, chunk_index));
                    texts.push(chunk.content.clone());
                }
            }
        }

        debug!(
            documents = indexed.len(),
            chunks = chunk_slots.len(),
            "Embedding documents and chunks"
        );

        let embeddings = self
            .client
            .embed_batch(&texts)
            .await
            .with_context(|| format!("Failed to embed {} texts", texts.len()))?;

        let total_tokens = embeddings.iter().map(|e| u64::from(e.tokens)).sum();
        let mut embeddings = embeddings.into_iter();

        for item in indexed.iter_mut() {
            if let Some(embedding) = embeddings.next() {
                item.document.embedding = Some(codec::serialize(&embedding.vector));
            }
        }
        for ((doc_index, chunk_index), embedding) in chunk_slots.iter().zip(embeddings) {
            indexed[*doc_index].chunks[*chunk_index].embedding =
                Some(codec::serialize(&embedding.vector));
        }

        let report = IndexingReport {
            documents_indexed: indexed.len(),
            chunks_created: indexed.iter().map(|item| item.chunks.len()).sum(),
            chunks_embedded: chunk_slots.len(),
            total_tokens,
        };

        info!(
            documents = report.documents_indexed,
            chunks = report.chunks_created,
            tokens = report.total_tokens,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Indexing batch completed"
        );

        Ok((indexed, report))
    }

    /// Index `documents` and write them with their chunks into `store`.
    pub async fn index_into(
        &self,
        store: &InMemoryStore,
        documents: Vec<Document>,
    ) -> Result<IndexingReport> {
        let (indexed, report) = self.index_documents(documents).await?;

        for item in indexed {
            let id = item.document.id.clone();
            store.upsert_document(item.document).await;
            store.replace_chunks(&id, item.chunks).await;
        }

        Ok(report)
    }
}
