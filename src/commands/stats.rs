//! Stats command for displaying index statistics and metrics

use anyhow::Result;
use std::path::Path;

use super::{load_config, open_store};
use crate::metrics::{gather_metrics, MetricSnapshot, INDEXED_CHUNKS, INDEXED_DOCUMENTS};
use crate::storage::InMemoryStore;

/// Run the stats command
///
/// # Arguments
/// * `prometheus` - If true, output in Prometheus text format
pub async fn run(root: &Path, prometheus: bool) -> Result<()> {
    let config = load_config(root)?;
    let store = open_store(root, &config)?;
    let (documents, chunks) = refresh_index_gauges(&store).await;

    if prometheus {
        print!("{}", gather_metrics());
        return Ok(());
    }

    let snapshot = MetricSnapshot::capture();

    println!("docrag Index Statistics");
    println!("=======================\n");

    println!("Index Contents:");
    println!("  Total documents: {}", documents);
    println!("  Total chunks:    {}", chunks);
    println!();

    println!("Search Metrics:");
    println!("  Total requests:   {:.0}", snapshot.search_requests_total);
    if snapshot.search_requests_total > 0.0 {
        println!("  Average latency:  {:.3}s", snapshot.search_latency_avg);
        println!("  Average results:  {:.1}", snapshot.search_results_avg);
    }
    println!(
        "  Branch failures:  vector {:.0}, keyword {:.0}",
        snapshot.vector_branch_failures, snapshot.keyword_branch_failures
    );
    println!();

    println!("Embedding Metrics:");
    println!("  Total requests:   {:.0}", snapshot.embedding_requests_total);
    if snapshot.embedding_requests_total > 0.0 {
        println!("  Average latency:  {:.3}s", snapshot.embedding_latency_avg);
        println!("  Total tokens:     {:.0}", snapshot.embedding_tokens_total);
    }
    println!();

    println!("Storage:");
    println!("  Store path: {}", config.snapshot_path(root).display());

    Ok(())
}

/// Set the index gauges from the store contents.
async fn refresh_index_gauges(store: &InMemoryStore) -> (usize, usize) {
    let documents = store.document_count().await;
    let chunks = store.chunk_count().await;

    INDEXED_DOCUMENTS.set(documents as f64);
    INDEXED_CHUNKS.set(chunks as f64);

    (documents, chunks)
}
