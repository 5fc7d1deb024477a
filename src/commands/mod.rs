pub mod index;
pub mod init;
pub mod search;
pub mod similar;
pub mod stats;
pub mod status;

use anyhow::{bail, Result};
use std::path::Path;
use std::sync::Arc;

use crate::storage::{InMemoryStore, Snapshot};
use crate::Config;

/// Load the configuration, failing when `docrag init` has not been run.
fn load_config(root: &Path) -> Result<Config> {
    if !Config::is_initialized(root) {
        bail!("docrag is not initialized. Run 'docrag init' first.");
    }
    Config::load(root)
}

fn open_store(root: &Path, config: &Config) -> Result<Arc<InMemoryStore>> {
    let snapshot = Snapshot::load(&config.snapshot_path(root))?;
    Ok(Arc::new(InMemoryStore::from_snapshot(snapshot)))
}

/// Format a preview of the content, limiting to max_lines
fn format_preview(content: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut preview: Vec<String> = lines
        .iter()
        .take(max_lines)
        .map(|line| format!("   {}", line))
        .collect();
    if lines.len() > max_lines {
        preview.push("   ...".to_string());
    }
    preview.join("\n")
}
