//! Field-weighted keyword search.
//!
//! Each query term scores the fields it appears in (case-insensitive
//! substring match): title 5, summary 4, key points 3, tags 2, body 1. The sum
//! is normalized by `terms × 15`, so a score of 1.0 means every term was found
//! in every field.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use super::traits::{Search, SearchQuery};
use super::types::{excerpt, sort_by_similarity, SearchResult};
use crate::model::Document;
use crate::storage::DocumentStore;
use crate::text::TextFlattener;

const TITLE_WEIGHT: f32 = 5.0;
const SUMMARY_WEIGHT: f32 = 4.0;
const KEY_POINTS_WEIGHT: f32 = 3.0;
const TAGS_WEIGHT: f32 = 2.0;
const BODY_WEIGHT: f32 = 1.0;
const MAX_TERM_WEIGHT: f32 =
    TITLE_WEIGHT + SUMMARY_WEIGHT + KEY_POINTS_WEIGHT + TAGS_WEIGHT + BODY_WEIGHT;

const MIN_TERM_CHARS: usize = 3;

const STOP_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
    "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has", "have",
    "having", "he", "her", "his", "how", "if", "in", "into", "is", "it", "its", "may", "might",
    "must", "not", "of", "on", "or", "our", "shall", "she", "should", "so", "than", "that", "the",
    "their", "them", "then", "there", "these", "they", "this", "those", "to", "was", "we", "were",
    "what", "when", "where", "which", "who", "whom", "whose", "why", "will", "with", "would",
    "you", "your",
];

/// Lowercase query terms, without stop words or terms under three characters.
pub fn extract_keywords(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|term| term.chars().count() >= MIN_TERM_CHARS)
        .filter(|term| !STOP_WORDS.contains(&term.as_str()))
        .collect()
}

/// Lowercased document fields, prepared once per document.
struct ScoringFields {
    title: String,
    summary: String,
    key_points: Vec<String>,
    tags: Vec<String>,
    body: String,
}

impl ScoringFields {
    fn new(document: &Document, body: &str) -> Self {
        Self {
            title: document.title.to_lowercase(),
            summary: document.summary.as_deref().unwrap_or("").to_lowercase(),
            key_points: document.key_points.iter().map(|p| p.to_lowercase()).collect(),
            tags: document.tags.iter().map(|t| t.to_lowercase()).collect(),
            body: body.to_lowercase(),
        }
    }

    fn term_weight(&self, term: &str) -> f32 {
        let mut weight = 0.0;
        if self.title.contains(term) {
            weight += TITLE_WEIGHT;
        }
        if self.summary.contains(term) {
            weight += SUMMARY_WEIGHT;
        }
        if self.key_points.iter().any(|p| p.contains(term)) {
            weight += KEY_POINTS_WEIGHT;
        }
        if self.tags.iter().any(|t| t.contains(term)) {
            weight += TAGS_WEIGHT;
        }
        if self.body.contains(term) {
            weight += BODY_WEIGHT;
        }
        weight
    }
}

/// Scores a document against a set of lowercase terms.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordScorer;

impl KeywordScorer {
    /// Normalized score in [0, 1]; 0 when `terms` is empty.
    pub fn score(&self, document: &Document, body: &str, terms: &BTreeSet<String>) -> f32 {
        self.score_with_matches(document, body, terms).0
    }

    fn score_with_matches(
        &self,
        document: &Document,
        body: &str,
        terms: &BTreeSet<String>,
    ) -> (f32, Vec<String>) {
        if terms.is_empty() {
            return (0.0, Vec::new());
        }

        let fields = ScoringFields::new(document, body);
        let mut matched = Vec::new();
        let mut raw = 0.0;

        for term in terms {
            let weight = fields.term_weight(term);
            if weight > 0.0 {
                matched.push(term.clone());
                raw += weight;
            }
        }

        (raw / (terms.len() as f32 * MAX_TERM_WEIGHT), matched)
    }
}

/// Keyword search over the active documents of a store.
pub struct KeywordSearch {
    store: Arc<dyn DocumentStore>,
    flattener: Arc<dyn TextFlattener>,
    scorer: KeywordScorer,
    excerpt_chars: usize,
}

impl KeywordSearch {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        flattener: Arc<dyn TextFlattener>,
        excerpt_chars: usize,
    ) -> Self {
        Self {
            store,
            flattener,
            scorer: KeywordScorer,
            excerpt_chars,
        }
    }
}

#[async_trait]
impl Search for KeywordSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        let terms = extract_keywords(&query.text);
        if terms.is_empty() || query.limit == 0 {
            debug!(query = %query.text, "No usable keywords in query");
            return Ok(Vec::new());
        }

        let documents = self
            .store
            .list_active_documents(&query.scope_filter())
            .await
            .with_context(|| "Failed to list documents for keyword search")?;

        let mut results = Vec::new();
        for document in &documents {
            let body = document.resolve_body(self.flattener.as_ref());
            let (score, matched) = self.scorer.score_with_matches(document, &body, &terms);
            if score <= 0.0 {
                continue;
            }

            let mut result = SearchResult::for_document(
                document,
                excerpt(document, &body, self.excerpt_chars),
                score,
            );
            result
                .metadata
                .extra
                .insert("matchedTerms".to_string(), serde_json::json!(matched));
            results.push(result);
        }

        sort_by_similarity(&mut results);
        results.truncate(query.limit);

        debug!(
            search_type = "keyword",
            terms = terms.len(),
            candidates = documents.len(),
            results = results.len(),
            "Keyword search completed"
        );

        Ok(results)
    }

    fn search_type(&self) -> &'static str {
        "keyword"
    }
}
