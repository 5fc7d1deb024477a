//! Search module providing vector, keyword, and hybrid search.
//!
//! This module contains:
//! - `similarity` - Cosine similarity with dimension checking
//! - `keyword` - Field-weighted keyword scoring and search
//! - `vector` - Semantic search over stored embeddings
//! - `hybrid` - Vector + keyword search merged with RRF
//! - `similar` - Related-document lookup
//! - `engine` - `SearchEngine` facade and availability probe

mod engine;
mod error;
pub mod hybrid;
pub mod keyword;
mod similar;
mod similarity;
pub mod traits;
mod types;
mod vector;

// Re-export commonly used types
pub use engine::{probe_availability, Availability, SearchEngine, SearchRequest};
pub use error::SearchError;
pub use hybrid::{HybridSearch, RrfFusion};
pub use keyword::{extract_keywords, KeywordScorer, KeywordSearch};
pub use similar::{SimilarOptions, SimilarityLookup};
pub use similarity::{cosine_similarity, DimensionMismatch};
pub use traits::{Search, SearchQuery};
pub use types::{ResultKey, ResultKind, ResultMetadata, SearchResult};
pub use vector::{VectorSearch, VectorSearchOptions};
