use thiserror::Error;

/// Errors raised while obtaining embeddings.
///
/// Provider failures carry the batch they belong to; the client never retries
/// on its own.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Provider credentials are not configured.
    #[error("Missing embedding provider credentials: {0}")]
    MissingCredentials(String),

    /// The provider call failed (transport error or non-success status).
    #[error("Embedding request failed for batch {batch_index} ({batch_size} items): {message}")]
    Request {
        batch_index: usize,
        batch_size: usize,
        message: String,
    },

    /// The provider answered with a payload we cannot use.
    #[error("Malformed embedding response for batch {batch_index} ({batch_size} items): {message}")]
    MalformedResponse {
        batch_index: usize,
        batch_size: usize,
        message: String,
    },
}

impl EmbeddingError {
    /// Batch context for provider errors.
    pub fn batch(&self) -> Option<(usize, usize)> {
        match self {
            Self::Request {
                batch_index,
                batch_size,
                ..
            }
            | Self::MalformedResponse {
                batch_index,
                batch_size,
                ..
            } => Some((*batch_index, *batch_size)),
            Self::MissingCredentials(_) => None,
        }
    }
}
