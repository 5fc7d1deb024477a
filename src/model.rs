//! Documents and chunks as the engine sees them.
//!
//! Both types are owned by the external ingestion/editing layer; the engine
//! only reads them (and the ingestion pipeline fills in their embeddings).

use std::borrow::Cow;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::text::TextFlattener;

/// Lifecycle state of a document. Only active documents are searchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Active,
    Archived,
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Archived => write!(f, "archived"),
        }
    }
}

/// An identifiable content unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Assigned at ingestion when left empty.
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicable_when: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Flattened plain text. Derived from `content` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Structured rich content, flattened on demand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
    /// Serialized embedding vector (see [`crate::embeddings::codec`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<String>,
    #[serde(default)]
    pub status: DocumentStatus,
    /// Owning collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Create an active document with just an id and a title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == DocumentStatus::Active
    }

    /// The plain-text body, flattening rich content if no body was precomputed.
    pub fn resolve_body(&self, flattener: &dyn TextFlattener) -> Cow<'_, str> {
        match (&self.body, &self.content) {
            (Some(body), _) => Cow::Borrowed(body.as_str()),
            (None, Some(content)) => Cow::Owned(flattener.flatten(content)),
            (None, None) => Cow::Borrowed(""),
        }
    }

    /// Text submitted to the embedding provider for the document as a whole.
    pub fn embedding_text(&self, body: &str) -> String {
        let mut parts = vec![self.title.clone()];

        if let Some(summary) = self.summary.as_deref().filter(|s| !s.is_empty()) {
            parts.push(summary.to_string());
        }
        if !self.key_points.is_empty() {
            parts.push(self.key_points.join("\n"));
        }
        if let Some(when) = self.applicable_when.as_deref().filter(|s| !s.is_empty()) {
            parts.push(format!("Applicable when: {}", when));
        }
        if !self.tags.is_empty() {
            let tags: Vec<&str> = self.tags.iter().map(String::as_str).collect();
            parts.push(format!("Tags: {}", tags.join(", ")));
        }
        if !body.trim().is_empty() {
            parts.push(body.to_string());
        }

        parts.join("\n\n")
    }
}

/// Structural hints attached to a chunk by the chunker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    /// Most recent heading at or before the end of the chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Headings that appear inside the chunk, in order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headings: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_code_block: Option<bool>,
}

impl ChunkMetadata {
    pub fn is_empty(&self) -> bool {
        self.section.is_none() && self.headings.is_none() && self.is_code_block.is_none()
    }
}

/// A contiguous slice of one document's body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_id: Option<String>,
    pub content: String,
    /// Character offset of the first covered character in the source body.
    pub start_offset: usize,
    /// Character offset one past the last covered character.
    pub end_offset: usize,
    #[serde(default)]
    pub metadata: ChunkMetadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<String>,
}
