use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    /// Vector or hybrid search was requested without an embedding client.
    #[error("Semantic search unavailable for {0} mode: no embedding provider configured")]
    SemanticUnavailable(String),

    /// Both hybrid branches failed; an empty result would be misleading.
    #[error("All search branches failed (vector: {vector}; keyword: {keyword})")]
    AllBranchesFailed { vector: String, keyword: String },
}
