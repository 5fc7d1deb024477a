//! Index command implementation.
//!
//! Reads a JSON array of documents, chunks and embeds them, and writes the
//! result into the snapshot store under `.docrag/`.

use anyhow::{Context, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::{load_config, open_store};
use crate::embeddings::EmbeddingClient;
use crate::indexer::{Chunker, IndexingPipeline, IndexingReport};
use crate::metrics::{INDEXED_CHUNKS, INDEXED_DOCUMENTS};
use crate::model::Document;
use crate::storage::InMemoryStore;
use crate::text::RichTextFlattener;

/// Run the index command.
///
/// Documents without an id get a fresh UUID; documents already in the store
/// are replaced along with their chunks.
pub async fn run(root: &Path, corpus: &Path) -> Result<()> {
    let config = load_config(root)?;

    let content = std::fs::read_to_string(corpus)
        .with_context(|| format!("Failed to read corpus from {:?}", corpus))?;
    let mut documents: Vec<Document> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse corpus from {:?}", corpus))?;
    prepare_documents(&mut documents);

    if documents.is_empty() {
        println!("Corpus is empty. Nothing to index.");
        return Ok(());
    }

    let client = Arc::new(EmbeddingClient::from_config(&config.embeddings)?);
    let pipeline = IndexingPipeline::new(
        Chunker::new(config.chunker.clone()),
        client,
        Arc::new(RichTextFlattener),
    );
    let store = open_store(root, &config)?;

    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] Indexing: [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )?
            .progress_chars("#>-"),
    );

    let snapshot_path = config.snapshot_path(root);
    let batch_size = config.embeddings.batch_size.max(1);
    let report =
        index_in_batches(&pipeline, &store, documents, batch_size, &snapshot_path, &pb).await?;
    pb.finish_with_message("done");

    INDEXED_DOCUMENTS.set(store.document_count().await as f64);
    INDEXED_CHUNKS.set(store.chunk_count().await as f64);

    info!(
        documents = report.documents_indexed,
        chunks = report.chunks_created,
        tokens = report.total_tokens,
        path = %snapshot_path.display(),
        "Index written"
    );
    println!("{}", report.summary());
    println!("Store: {}", snapshot_path.display());

    Ok(())
}

/// Index `documents` batch by batch, saving the store after every batch.
///
/// A failing batch leaves every earlier batch on disk.
async fn index_in_batches(
    pipeline: &IndexingPipeline,
    store: &InMemoryStore,
    documents: Vec<Document>,
    batch_size: usize,
    snapshot_path: &Path,
    pb: &ProgressBar,
) -> Result<IndexingReport> {
    let mut report = IndexingReport::default();
    let mut remaining = documents.into_iter().peekable();

    while remaining.peek().is_some() {
        let batch: Vec<Document> = remaining.by_ref().take(batch_size.max(1)).collect();
        let batch_len = batch.len() as u64;

        let batch_report = pipeline.index_into(store, batch).await?;
        report.merge(&batch_report);
        store.snapshot().await.save(snapshot_path)?;

        pb.inc(batch_len);
        pb.set_message(format!("{} chunks", report.chunks_created));
    }

    Ok(report)
}

fn prepare_documents(documents: &mut [Document]) {
    let now = Utc::now();
    for document in documents.iter_mut() {
        if document.id.trim().is_empty() {
            document.id = Uuid::new_v4().to_string();
        }
        if document.updated_at.is_none() {
            document.updated_at = Some(now);
        }
    }
}
