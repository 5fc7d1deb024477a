use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::model::{Chunk, Document};

/// What a search result points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Document,
    Chunk,
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Document => write!(f, "document"),
            Self::Chunk => write!(f, "chunk"),
        }
    }
}

/// Identity of a result across search branches: `(kind, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultKey {
    pub kind: ResultKind,
    pub id: String,
}

impl fmt::Display for ResultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Annotations carried by a result.
///
/// Known fields are typed; anything else goes into `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headings: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_code_block: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_offset: Option<usize>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    /// 1-based rank in the vector branch of a hybrid search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector_rank: Option<usize>,
    /// 1-based rank in the keyword branch of a hybrid search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_rank: Option<usize>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// A ranked search hit.
///
/// `similarity` is raw cosine similarity for vector search, a field-weighted
/// score for keyword search and a normalized fusion score for hybrid search.
/// Values from different modes are not comparable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub kind: ResultKind,
    pub id: String,
    /// Owning document (equal to `id` for document results)
    pub document_id: String,
    pub title: String,
    pub content: String,
    pub similarity: f32,
    #[serde(default)]
    pub metadata: ResultMetadata,
}

impl SearchResult {
    pub fn for_document(document: &Document, content: String, similarity: f32) -> Self {
        Self {
            kind: ResultKind::Document,
            id: document.id.clone(),
            document_id: document.id.clone(),
            title: document.title.clone(),
            content,
            similarity,
            metadata: ResultMetadata {
                tags: document.tags.clone(),
                ..Default::default()
            },
        }
    }

    pub fn for_chunk(chunk: &Chunk, title: &str, similarity: f32) -> Self {
        Self {
            kind: ResultKind::Chunk,
            id: chunk.id.clone(),
            document_id: chunk.document_id.clone(),
            title: title.to_string(),
            content: chunk.content.clone(),
            similarity,
            metadata: ResultMetadata {
                section: chunk.metadata.section.clone(),
                headings: chunk.metadata.headings.clone(),
                is_code_block: chunk.metadata.is_code_block,
                start_offset: Some(chunk.start_offset),
                end_offset: Some(chunk.end_offset),
                ..Default::default()
            },
        }
    }

    pub fn key(&self) -> ResultKey {
        ResultKey {
            kind: self.kind,
            id: self.id.clone(),
        }
    }
}

/// Excerpt shown for a document hit: its summary, else the start of its body.
pub fn excerpt(document: &Document, body: &str, max_chars: usize) -> String {
    match document.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        Some(summary) => summary.to_string(),
        None => body.chars().take(max_chars).collect(),
    }
}

/// Sort descending by similarity, keeping the input order for ties.
pub fn sort_by_similarity(results: &mut [SearchResult]) {
    results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
}
