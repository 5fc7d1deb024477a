mod chunker;
mod pipeline;

pub use chunker::{ChunkSpan, Chunker};
pub use pipeline::{IndexedDocument, IndexingPipeline, IndexingReport};
