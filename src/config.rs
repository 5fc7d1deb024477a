use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::embeddings::EmbeddingsConfig;

const CONFIG_DIR: &str = ".docrag";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chunker: ChunkerConfig,

    #[serde(default)]
    pub embeddings: EmbeddingsConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Size thresholds for the paragraph chunker, in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Preferred chunk size
    #[serde(default = "default_target_size")]
    pub target_size: usize,

    /// Bodies shorter than this become a single chunk; buffers must exceed it before a flush
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,

    /// Hard ceiling, enforced regardless of paragraph boundaries
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    /// Trailing characters of a flushed chunk carried into the next one
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            target_size: default_target_size(),
            min_chunk_size: default_min_chunk_size(),
            max_chunk_size: default_max_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

fn default_target_size() -> usize {
    1000
}

fn default_min_chunk_size() -> usize {
    100
}

fn default_max_chunk_size() -> usize {
    2000
}

fn default_overlap() -> usize {
    200
}

/// Search mode configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Vector-only semantic search
    Vector,
    /// Keyword-only field-weighted search
    Keyword,
    /// Hybrid search combining vector and keyword results
    #[default]
    Hybrid,
}

impl SearchMode {
    /// Parse mode from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "vector" => Some(Self::Vector),
            "keyword" => Some(Self::Keyword),
            "hybrid" => Some(Self::Hybrid),
            _ => None,
        }
    }
}

impl std::fmt::Display for SearchMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchMode::Vector => write!(f, "vector"),
            SearchMode::Keyword => write!(f, "keyword"),
            SearchMode::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search mode: vector, keyword, or hybrid
    #[serde(default)]
    pub mode: SearchMode,

    /// Weight for vector results in rank fusion (0.0 - 1.0); keyword gets the rest
    #[serde(default = "default_vector_weight")]
    pub vector_weight: f32,

    /// RRF k constant (higher = smoother rank influence)
    #[serde(default = "default_rrf_k")]
    pub rrf_k: f32,

    /// Default number of results to return
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,

    /// Minimum cosine similarity for vector hits
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,

    /// Score chunks in addition to whole documents
    #[serde(default = "default_include_chunks")]
    pub include_chunks: bool,

    /// Characters of body used as the excerpt when a document has no summary
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,

    /// Default number of neighbours for similarity lookup
    #[serde(default = "default_similar_limit")]
    pub similar_limit: usize,

    /// Minimum cosine similarity for similarity lookup
    #[serde(default = "default_similar_min_similarity")]
    pub similar_min_similarity: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            mode: SearchMode::default(),
            vector_weight: default_vector_weight(),
            rrf_k: default_rrf_k(),
            default_limit: default_search_limit(),
            min_similarity: default_min_similarity(),
            include_chunks: default_include_chunks(),
            excerpt_chars: default_excerpt_chars(),
            similar_limit: default_similar_limit(),
            similar_min_similarity: default_similar_min_similarity(),
        }
    }
}

fn default_vector_weight() -> f32 {
    0.7
}

fn default_rrf_k() -> f32 {
    60.0
}

fn default_search_limit() -> usize {
    10
}

fn default_min_similarity() -> f32 {
    0.3
}

fn default_include_chunks() -> bool {
    true
}

fn default_excerpt_chars() -> usize {
    300
}

fn default_similar_limit() -> usize {
    5
}

fn default_similar_min_similarity() -> f32 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the JSON snapshot store (relative to .docrag/)
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
        }
    }
}

fn default_snapshot_path() -> String {
    "store.json".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write logs to rotating files
    #[serde(default)]
    pub enabled: bool,

    /// File log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log directory (relative paths resolve against the project root)
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,

    /// Log file name prefix
    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,

    /// Rotation: hourly, daily, minutely, never
    #[serde(default = "default_log_rotation")]
    pub rotation: String,

    /// Also log to stderr (filtered by RUST_LOG)
    #[serde(default = "default_log_stderr")]
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: default_log_level(),
            directory: default_log_directory(),
            file_prefix: default_log_file_prefix(),
            rotation: default_log_rotation(),
            stderr: default_log_stderr(),
        }
    }
}

fn default_log_level() -> String {
    "debug".to_string()
}

fn default_log_directory() -> PathBuf {
    PathBuf::from(".docrag/logs")
}

fn default_log_file_prefix() -> String {
    "docrag.log".to_string()
}

fn default_log_rotation() -> String {
    "daily".to_string()
}

fn default_log_stderr() -> bool {
    true
}

impl Config {
    /// Load configuration from the .docrag directory
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(CONFIG_DIR).join(CONFIG_FILE);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;

            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config from {:?}", config_path))
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to the .docrag directory
    pub fn save(&self, root: &Path) -> Result<()> {
        let config_dir = root.join(CONFIG_DIR);
        let config_path = config_dir.join(CONFIG_FILE);

        std::fs::create_dir_all(&config_dir)
            .with_context(|| format!("Failed to create config directory {:?}", config_dir))?;

        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    /// Get the path to the .docrag directory
    pub fn docrag_dir(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR)
    }

    /// Get the path to the snapshot store
    pub fn snapshot_path(&self, root: &Path) -> PathBuf {
        Self::docrag_dir(root).join(&self.storage.snapshot_path)
    }

    /// Check if docrag is initialized in the given directory
    pub fn is_initialized(root: &Path) -> bool {
        Self::docrag_dir(root).exists()
    }
}
