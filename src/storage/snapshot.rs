use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::model::{Chunk, Document};

/// On-disk form of the corpus used by the CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub chunks: Vec<Chunk>,
}

impl Snapshot {
    /// Load a snapshot; a missing file is an empty corpus.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot from {:?}", path))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot from {:?}", path))
    }

    /// Write the snapshot atomically: a temp file is synced, then renamed over `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        let content =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize snapshot")?;

        let temp_path = path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&temp_path)
                .with_context(|| format!("Failed to create temp file {:?}", temp_path))?;
            file.write_all(content.as_bytes())
                .with_context(|| format!("Failed to write snapshot to {:?}", temp_path))?;
            file.sync_all()
                .with_context(|| format!("Failed to sync snapshot {:?}", temp_path))?;
        }

        std::fs::rename(&temp_path, path)
            .with_context(|| format!("Failed to move snapshot into place at {:?}", path))
    }
}
