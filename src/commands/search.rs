use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::warn;

use super::{format_preview, load_config, open_store};
use crate::config::SearchMode;
use crate::embeddings::EmbeddingClient;
use crate::search::{probe_availability, ResultKind, SearchEngine, SearchRequest, SearchResult};
use crate::storage::ScopeFilter;
use crate::text::RichTextFlattener;

/// Run the search command
///
/// Falls back to keyword mode when no document in scope has an embedding,
/// so an unembedded corpus needs no provider credentials.
///
/// # Arguments
///
/// * `query` - The search query
/// * `mode` - Overrides the configured search mode
/// * `limit` - Maximum number of results to return
/// * `scope` - Restrict results to one scope
pub async fn run(
    root: &Path,
    query: &str,
    mode: Option<SearchMode>,
    limit: Option<usize>,
    scope: Option<String>,
) -> Result<()> {
    let config = load_config(root)?;
    let store = open_store(root, &config)?;

    let filter = ScopeFilter {
        scope_id: scope.clone(),
    };
    let mut mode = mode.unwrap_or(config.search.mode);

    if mode != SearchMode::Keyword {
        let availability = probe_availability(store.as_ref(), &filter).await?;
        if !availability.available {
            warn!(
                total = availability.total_count,
                "No embedded documents in scope, using keyword search"
            );
            println!("semantic search unavailable, showing keyword results\n");
            mode = SearchMode::Keyword;
        }
    }

    let mut engine = SearchEngine::new(store, Arc::new(RichTextFlattener), config.search.clone());
    if mode != SearchMode::Keyword {
        let client = EmbeddingClient::from_config(&config.embeddings)?;
        engine = engine.with_embeddings(Arc::new(client));
    }

    let request = SearchRequest {
        query: query.to_string(),
        scope_id: scope,
        limit,
    };
    let results = engine.search(&request, mode).await?;

    if results.is_empty() {
        println!("No results found for: {}", query);
        println!("\nMake sure you have indexed your documents with 'docrag index'");
        return Ok(());
    }

    println!(
        "Found {} results for: \"{}\" ({} search)\n",
        results.len(),
        query,
        mode
    );
    print_results(&results);

    Ok(())
}

pub(crate) fn print_results(results: &[SearchResult]) {
    for (i, result) in results.iter().enumerate() {
        // Format similarity as percentage
        let score_pct = (result.similarity * 100.0).round() as i32;

        match result.kind {
            ResultKind::Document => println!(
                "{}. {} [{}] (score: {}%)",
                i + 1,
                result.title,
                result.id,
                score_pct
            ),
            ResultKind::Chunk => {
                let section = result
                    .metadata
                    .section
                    .as_deref()
                    .map(|s| format!(" > {}", s))
                    .unwrap_or_default();
                println!(
                    "{}. {}{} [{}] (score: {}%)",
                    i + 1,
                    result.title,
                    section,
                    result.id,
                    score_pct
                );
            }
        }

        println!("{}", format_preview(&result.content, 5));
        println!();
    }
}
