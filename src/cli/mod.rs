use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::SearchMode;

#[derive(Parser)]
#[command(name = "docrag")]
#[command(author, version, about = "Hybrid semantic search over a document corpus")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize docrag in the current directory
    Init {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Chunk, embed and store documents from a JSON corpus file
    Index {
        /// Path to a JSON array of documents
        corpus: PathBuf,
    },

    /// Search the indexed documents
    Search {
        /// Search query
        query: String,

        /// Search mode: vector, keyword or hybrid (default from config)
        #[arg(short, long, value_parser = parse_mode)]
        mode: Option<SearchMode>,

        /// Maximum number of results to return
        #[arg(short, long)]
        limit: Option<usize>,

        /// Restrict results to one scope
        #[arg(short, long)]
        scope: Option<String>,
    },

    /// Find documents related to an indexed document
    Similar {
        /// Id of the source document
        id: String,

        /// Maximum number of results to return
        #[arg(short, long)]
        limit: Option<usize>,

        /// Minimum cosine similarity for a related document
        #[arg(long)]
        min_similarity: Option<f32>,

        /// Only compare against documents in this scope
        #[arg(short, long)]
        scope: Option<String>,
    },

    /// Show whether semantic search is available
    Status {
        /// Restrict the check to one scope
        #[arg(short, long)]
        scope: Option<String>,
    },

    /// Show index statistics and metrics
    Stats {
        /// Output in Prometheus format
        #[arg(long)]
        prometheus: bool,
    },
}

fn parse_mode(value: &str) -> Result<SearchMode, String> {
    SearchMode::parse(value)
        .ok_or_else(|| format!("unknown search mode '{}' (expected vector, keyword or hybrid)", value))
}
