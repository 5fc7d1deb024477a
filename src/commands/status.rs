//! Status command implementation.
//!
//! Shows where the store lives and whether semantic search is available.

use anyhow::Result;
use std::path::Path;

use super::{load_config, open_store};
use crate::search::probe_availability;
use crate::storage::ScopeFilter;
use crate::Config;

/// Run the status command.
///
/// Shows information about:
/// - Configuration and store location
/// - Configured provider and search mode
/// - Embedding coverage of active documents in scope
pub async fn run(root: &Path, scope: Option<String>) -> Result<()> {
    let config = load_config(root)?;
    let snapshot_path = config.snapshot_path(root);

    println!("Config directory: {}", Config::docrag_dir(root).display());
    println!("Store path: {}", snapshot_path.display());
    println!("Store exists: {}", snapshot_path.exists());
    println!();
    println!(
        "Embedding provider: {} ({})",
        config.embeddings.provider, config.embeddings.model
    );
    println!("Default search mode: {}", config.search.mode);

    let store = open_store(root, &config)?;
    let filter = ScopeFilter { scope_id: scope };
    let availability = probe_availability(store.as_ref(), &filter).await?;

    println!();
    match filter.scope_id.as_deref() {
        Some(scope) => println!("Scope: {}", scope),
        None => println!("Scope: all"),
    }
    println!("  Active documents:   {}", availability.total_count);
    println!("  Embedded documents: {}", availability.embedded_count);
    println!(
        "  Semantic search:    {}",
        if availability.available {
            "available"
        } else {
            "unavailable (keyword only)"
        }
    );

    Ok(())
}
