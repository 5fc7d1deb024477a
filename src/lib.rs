pub mod cli;
pub mod commands;
pub mod config;
pub mod embeddings;
pub mod indexer;
pub mod logging;
pub mod metrics;
pub mod model;
pub mod search;
pub mod storage;
pub mod text;

pub use config::Config;
pub use model::{Chunk, ChunkMetadata, Document, DocumentStatus};
