//! Hybrid search combining vector similarity and keyword matching.
//!
//! Both branches run concurrently and are merged with weighted Reciprocal
//! Rank Fusion (RRF). Fused scores are rescaled so the best hit is 1.0, which
//! makes them relative to the result set rather than absolute.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::error::SearchError;
use super::traits::{Search, SearchQuery};
use super::types::{ResultKey, SearchResult};
use crate::metrics::BRANCH_FAILURES;

/// Default RRF constant (k parameter).
pub const DEFAULT_RRF_K: f32 = 60.0;

/// Default weight for vector results; keyword results get the remainder.
pub const DEFAULT_VECTOR_WEIGHT: f32 = 0.7;

/// Weighted Reciprocal Rank Fusion over a vector and a keyword ranking.
///
/// `score = w / (k + vector_rank) + (1 - w) / (k + keyword_rank)`, where a
/// missing rank drops its term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RrfFusion {
    k: f32,
    vector_weight: f32,
}

struct FusedEntry {
    result: SearchResult,
    vector_rank: Option<usize>,
    keyword_rank: Option<usize>,
}

impl RrfFusion {
    pub fn new(vector_weight: f32, k: f32) -> Self {
        Self {
            k,
            vector_weight: vector_weight.clamp(0.0, 1.0),
        }
    }

    pub fn k(&self) -> f32 {
        self.k
    }

    pub fn vector_weight(&self) -> f32 {
        self.vector_weight
    }

    /// Fuse two rankings into at most `limit` results.
    ///
    /// Items are identified by `(kind, id)`. When both rankings contain an
    /// item, the vector branch's payload is kept.
    pub fn fuse(
        &self,
        vector_results: Vec<SearchResult>,
        keyword_results: Vec<SearchResult>,
        limit: usize,
    ) -> Vec<SearchResult> {
        let mut entries: Vec<FusedEntry> = Vec::new();
        let mut positions: HashMap<ResultKey, usize> = HashMap::new();

        for (rank, result) in vector_results.into_iter().enumerate() {
            positions.entry(result.key()).or_insert_with(|| {
                entries.push(FusedEntry {
                    result,
                    vector_rank: Some(rank + 1),
                    keyword_rank: None,
                });
                entries.len() - 1
            });
        }

        for (rank, result) in keyword_results.into_iter().enumerate() {
            let key = result.key();
            match positions.get(&key).copied() {
                Some(position) => {
                    let entry = &mut entries[position];
                    if entry.keyword_rank.is_none() {
                        entry.keyword_rank = Some(rank + 1);
                    }
                }
                None => {
                    positions.insert(key, entries.len());
                    entries.push(FusedEntry {
                        result,
                        vector_rank: None,
                        keyword_rank: Some(rank + 1),
                    });
                }
            }
        }

        let mut scored: Vec<(FusedEntry, f32)> = entries
            .into_iter()
            .map(|entry| {
                let score = self.score(entry.vector_rank, entry.keyword_rank);
                (entry, score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);

        let max = scored.first().map(|(_, score)| *score).unwrap_or(0.0);

        scored
            .into_iter()
            .map(|(entry, score)| {
                let mut result = entry.result;
                result.similarity = if max > 0.0 { score / max } else { 0.0 };
                result.metadata.vector_rank = entry.vector_rank;
                result.metadata.keyword_rank = entry.keyword_rank;
                result
            })
            .collect()
    }

    fn score(&self, vector_rank: Option<usize>, keyword_rank: Option<usize>) -> f32 {
        let mut ranks = Vec::with_capacity(2);
        if let Some(rank) = vector_rank {
            ranks.push((rank, self.vector_weight));
        }
        if let Some(rank) = keyword_rank {
            ranks.push((rank, 1.0 - self.vector_weight));
        }
        rrf_score(&ranks, self.k)
    }
}

impl Default for RrfFusion {
    fn default() -> Self {
        Self::new(DEFAULT_VECTOR_WEIGHT, DEFAULT_RRF_K)
    }
}

/// Compute RRF score for a single result across multiple rankings.
///
/// `ranks` holds `(rank, weight)` pairs with 1-based ranks.
pub fn rrf_score(ranks: &[(usize, f32)], k: f32) -> f32 {
    ranks
        .iter()
        .map(|(rank, weight)| weight / (k + *rank as f32))
        .sum()
}

/// Hybrid search over any vector and keyword [`Search`] pair.
///
/// A failing branch is logged and counted as empty; only a failure of both
/// branches is returned to the caller.
pub struct HybridSearch {
    vector: Arc<dyn Search>,
    keyword: Arc<dyn Search>,
    fusion: RrfFusion,
}

impl HybridSearch {
    pub fn new(vector: Arc<dyn Search>, keyword: Arc<dyn Search>, fusion: RrfFusion) -> Self {
        Self {
            vector,
            keyword,
            fusion,
        }
    }

    pub fn fusion(&self) -> &RrfFusion {
        &self.fusion
    }
}

fn branch_or_empty(
    branch: &'static str,
    outcome: Result<Vec<SearchResult>>,
    query: &str,
) -> Vec<SearchResult> {
    match outcome {
        Ok(results) => results,
        Err(e) => {
            BRANCH_FAILURES.with_label_values(&[branch]).inc();
            warn!(
                branch = branch,
                query = query,
                error = %format!("{:#}", e),
                "Search branch failed, continuing with the other branch"
            );
            Vec::new()
        }
    }
}

#[async_trait]
impl Search for HybridSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        if query.limit == 0 {
            return Ok(Vec::new());
        }

        let start = Instant::now();

        // Fetch more candidates from each branch for better fusion
        let branch_query = query.with_limit(query.limit.saturating_mul(2));

        let (vector_outcome, keyword_outcome) = tokio::join!(
            self.vector.search(&branch_query),
            self.keyword.search(&branch_query)
        );

        let (vector_results, keyword_results) = match (vector_outcome, keyword_outcome) {
            (Err(vector_err), Err(keyword_err)) => {
                return Err(SearchError::AllBranchesFailed {
                    vector: format!("{:#}", vector_err),
                    keyword: format!("{:#}", keyword_err),
                }
                .into());
            }
            (vector_outcome, keyword_outcome) => (
                branch_or_empty("vector", vector_outcome, &query.text),
                branch_or_empty("keyword", keyword_outcome, &query.text),
            ),
        };

        let vector_count = vector_results.len();
        let keyword_count = keyword_results.len();
        let fused = self.fusion.fuse(vector_results, keyword_results, query.limit);

        info!(
            search_type = "hybrid",
            query = %query.text,
            results = fused.len(),
            vector_candidates = vector_count,
            keyword_candidates = keyword_count,
            vector_weight = self.fusion.vector_weight(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Hybrid search completed"
        );

        Ok(fused)
    }

    fn search_type(&self) -> &'static str {
        "hybrid"
    }
}
