use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use super::search::print_results;
use super::{load_config, open_store};
use crate::search::SearchEngine;
use crate::text::RichTextFlattener;

/// Run the similar command
///
/// Uses stored embeddings only, so no provider is contacted.
pub async fn run(
    root: &Path,
    id: &str,
    limit: Option<usize>,
    min_similarity: Option<f32>,
    scope: Option<String>,
) -> Result<()> {
    let config = load_config(root)?;
    let store = open_store(root, &config)?;
    let engine = SearchEngine::new(store, Arc::new(RichTextFlattener), config.search.clone());

    let mut options = engine.similar_options();
    if let Some(limit) = limit {
        options.limit = limit;
    }
    if let Some(min_similarity) = min_similarity {
        options.min_similarity = min_similarity;
    }
    options.scope_id = scope;

    let results = engine.find_similar(id, &options).await?;

    if results.is_empty() {
        println!("No documents similar to: {}", id);
        return Ok(());
    }

    println!("Found {} documents similar to: {}\n", results.len(), id);
    print_results(&results);

    Ok(())
}
