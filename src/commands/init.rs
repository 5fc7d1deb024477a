use anyhow::{bail, Result};
use std::path::Path;
use tracing::info;

use crate::Config;

pub async fn run(root: &Path, force: bool) -> Result<()> {
    if Config::is_initialized(root) && !force {
        bail!(
            "docrag is already initialized in {:?}. Use --force to overwrite the configuration.",
            Config::docrag_dir(root)
        );
    }

    let config = Config::default();
    config.save(root)?;

    info!("Initialized docrag in {:?}", Config::docrag_dir(root));
    println!(
        "✓ Created {} with default configuration",
        Config::docrag_dir(root).display()
    );
    println!("\nNext steps:");
    println!("  1. Edit .docrag/config.toml to choose an embedding provider");
    println!("  2. Run 'docrag index <corpus.json>' to index your documents");
    println!("  3. Run 'docrag search <query>' to search them");

    Ok(())
}
