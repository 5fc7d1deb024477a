use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::SearchError;
use super::keyword::KeywordSearch;
use super::similarity::cosine_similarity;
use super::traits::{Search, SearchQuery};
use super::types::{excerpt, sort_by_similarity, SearchResult};
use crate::config::SearchConfig;
use crate::embeddings::codec;
use crate::model::Document;
use crate::storage::{DocumentStore, ScopeFilter};
use crate::text::TextFlattener;

/// Options for [`SimilarityLookup::find_similar`].
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarOptions {
    pub limit: usize,
    pub min_similarity: f32,
    /// Restrict candidates to one scope; `None` compares against every document.
    pub scope_id: Option<String>,
}

impl Default for SimilarOptions {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for SimilarOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            limit: config.similar_limit,
            min_similarity: config.similar_min_similarity,
            scope_id: None,
        }
    }
}

/// Finds documents related to a given document.
///
/// Compares stored embeddings directly, so no provider call is made. A source
/// document without a usable embedding falls back to keyword search on its
/// title and summary.
pub struct SimilarityLookup {
    store: Arc<dyn DocumentStore>,
    keyword: Arc<KeywordSearch>,
    flattener: Arc<dyn TextFlattener>,
    excerpt_chars: usize,
}

impl SimilarityLookup {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        keyword: Arc<KeywordSearch>,
        flattener: Arc<dyn TextFlattener>,
        excerpt_chars: usize,
    ) -> Self {
        Self {
            store,
            keyword,
            flattener,
            excerpt_chars,
        }
    }

    /// Documents most similar to `document_id`, never including it.
    pub async fn find_similar(
        &self,
        document_id: &str,
        options: &SimilarOptions,
    ) -> Result<Vec<SearchResult>> {
        let source = self
            .store
            .get_document(document_id)
            .await
            .with_context(|| format!("Failed to load document {}", document_id))?
            .ok_or_else(|| SearchError::DocumentNotFound(document_id.to_string()))?;

        let results = match codec::parse(source.embedding.as_deref()) {
            Some(vector) => self.by_embedding(&source, &vector, options).await?,
            None => self.by_keywords(&source, options).await?,
        };

        info!(
            document_id = document_id,
            results = results.len(),
            "Similar documents found"
        );

        Ok(results)
    }

    async fn by_embedding(
        &self,
        source: &Document,
        vector: &[f32],
        options: &SimilarOptions,
    ) -> Result<Vec<SearchResult>> {
        let filter = ScopeFilter {
            scope_id: options.scope_id.clone(),
        };
        let documents = self
            .store
            .list_active_documents(&filter)
            .await
            .with_context(|| "Failed to list documents for similarity lookup")?;

        let mut results = Vec::new();
        for document in documents.iter().filter(|doc| doc.id != source.id) {
            let Some(other) = codec::parse(document.embedding.as_deref()) else {
                continue;
            };

            let similarity = cosine_similarity(vector, &other).with_context(|| {
                format!("Failed to compare {} with {}", source.id, document.id)
            })?;
            if similarity < options.min_similarity {
                continue;
            }

            let body = document.resolve_body(self.flattener.as_ref());
            results.push(SearchResult::for_document(
                document,
                excerpt(document, &body, self.excerpt_chars),
                similarity,
            ));
        }

        sort_by_similarity(&mut results);
        results.truncate(options.limit);
        Ok(results)
    }

    async fn by_keywords(
        &self,
        source: &Document,
        options: &SimilarOptions,
    ) -> Result<Vec<SearchResult>> {
        debug!(
            document_id = %source.id,
            "Document has no usable embedding, falling back to keyword search"
        );

        let mut text = source.title.clone();
        if let Some(summary) = source.summary.as_deref() {
            text.push(' ');
            text.push_str(summary);
        }

        // One extra result leaves room for the source document itself
        let query = SearchQuery::new(text, options.limit.saturating_add(1))
            .with_scope(options.scope_id.clone());

        let mut results: Vec<SearchResult> = self
            .keyword
            .search(&query)
            .await?
            .into_iter()
            .filter(|result| result.document_id != source.id)
            .collect();
        results.truncate(options.limit);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use crate::text::RichTextFlattener;

    fn lookup(store: Arc<InMemoryStore>) -> SimilarityLookup {
        let flattener: Arc<dyn TextFlattener> = Arc::new(RichTextFlattener);
        let keyword = Arc::new(KeywordSearch::new(store.clone(), flattener.clone(), 300));
        SimilarityLookup::new(store, keyword, flattener, 300)
    }

    fn embedded(id: &str, title: &str, vector: &[f32]) -> Document {
        let mut doc = Document::new(id, title);
        doc.embedding = Some(codec::serialize(vector));
        doc
    }

    #[tokio::test]
    async fn test_identical_embeddings_rank_first() {
        let store = Arc::new(InMemoryStore::new());
        store
            .upsert_document(embedded("a", "Onboarding checklist", &[0.2, 0.9, 0.1]))
            .await;
        store
            .upsert_document(embedded("b", "Vendor contracts", &[0.2, 0.9, 0.1]))
            .await;
        store
            .upsert_document(embedded("c", "Release notes", &[0.3, 0.8, 0.3]))
            .await;
        store
            .upsert_document(embedded("d", "Unrelated", &[1.0, -0.5, 0.0]))
            .await;

        let results = lookup(store)
            .find_similar("a", &SimilarOptions::default())
            .await
            .unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert!((results[0].similarity - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_unknown_document() {
        let store = Arc::new(InMemoryStore::new());
        let err = lookup(store)
            .find_similar("missing", &SimilarOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SearchError>(),
            Some(SearchError::DocumentNotFound(id)) if id == "missing"
        ));
    }

    #[tokio::test]
    async fn test_unembedded_source_falls_back_to_keywords() {
        let store = Arc::new(InMemoryStore::new());
        let mut source = Document::new("src", "Travel expense policy");
        source.summary = Some("Rules for reimbursement".to_string());
        store.upsert_document(source).await;
        store
            .upsert_document(Document::new("other", "Expense report template"))
            .await;
        store
            .upsert_document(Document::new("none", "Office seating chart"))
            .await;

        let results = lookup(store)
            .find_similar("src", &SimilarOptions::default())
            .await
            .unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["other"]);
    }

    #[tokio::test]
    async fn test_compares_across_scopes_by_default() {
        let store = Arc::new(InMemoryStore::new());
        let mut a = embedded("a", "A", &[1.0, 0.0]);
        a.scope_id = Some("s1".to_string());
        let mut b = embedded("b", "B", &[1.0, 0.0]);
        b.scope_id = Some("s2".to_string());
        let mut c = embedded("c", "C", &[0.8, 0.6]);
        c.scope_id = Some("s1".to_string());
        store.upsert_document(a).await;
        store.upsert_document(b).await;
        store.upsert_document(c).await;
        let lookup = lookup(store);

        let results = lookup
            .find_similar("a", &SimilarOptions::default())
            .await
            .unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);

        let scoped = SimilarOptions {
            scope_id: Some("s1".to_string()),
            ..SimilarOptions::default()
        };
        let results = lookup.find_similar("a", &scoped).await.unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
    }
}
