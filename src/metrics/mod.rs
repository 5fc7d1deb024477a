//! Prometheus metrics for docrag
//!
//! Counters and histograms for search, indexing and embedding operations.
//! The `stats` command reads them back through [`MetricSnapshot`].

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Encoder, Gauge, Histogram, HistogramOpts, Opts, Registry, TextEncoder,
};
use std::sync::Once;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Search metrics
    // ============================================================================

    /// Total number of search requests
    pub static ref SEARCH_REQUESTS: Counter = Counter::with_opts(
        Opts::new(
            "docrag_search_requests_total",
            "Total number of search requests"
        )
    ).expect("Failed to create SEARCH_REQUESTS counter");

    /// Search request latency in seconds
    pub static ref SEARCH_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "docrag_search_latency_seconds",
            "Search request latency in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0])
    ).expect("Failed to create SEARCH_LATENCY histogram");

    /// Number of search results returned per request
    pub static ref SEARCH_RESULTS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "docrag_search_results_count",
            "Number of search results returned per request"
        ).buckets(vec![0.0, 1.0, 5.0, 10.0, 20.0, 50.0])
    ).expect("Failed to create SEARCH_RESULTS histogram");

    /// Hybrid branches that failed and were treated as empty, by branch
    pub static ref BRANCH_FAILURES: CounterVec = CounterVec::new(
        Opts::new(
            "docrag_branch_failures_total",
            "Hybrid search branches that failed and were dropped"
        ),
        &["branch"]
    ).expect("Failed to create BRANCH_FAILURES counter");

    // ============================================================================
    // Index metrics
    // ============================================================================

    /// Documents embedded by the last indexing run
    pub static ref INDEXED_DOCUMENTS: Gauge = Gauge::with_opts(
        Opts::new(
            "docrag_indexed_documents_total",
            "Documents embedded by the last indexing run"
        )
    ).expect("Failed to create INDEXED_DOCUMENTS gauge");

    /// Chunks produced by the last indexing run
    pub static ref INDEXED_CHUNKS: Gauge = Gauge::with_opts(
        Opts::new(
            "docrag_indexed_chunks_total",
            "Chunks produced by the last indexing run"
        )
    ).expect("Failed to create INDEXED_CHUNKS gauge");

    // ============================================================================
    // Embedding metrics
    // ============================================================================

    /// Total provider requests (one per batch)
    pub static ref EMBEDDING_REQUESTS: Counter = Counter::with_opts(
        Opts::new(
            "docrag_embedding_requests_total",
            "Total embedding provider requests"
        )
    ).expect("Failed to create EMBEDDING_REQUESTS counter");

    /// Provider request latency in seconds
    pub static ref EMBEDDING_LATENCY: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "docrag_embedding_latency_seconds",
            "Embedding provider latency in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0])
    ).expect("Failed to create EMBEDDING_LATENCY histogram");

    /// Tokens reported by the provider
    pub static ref EMBEDDING_TOKENS: Counter = Counter::with_opts(
        Opts::new(
            "docrag_embedding_tokens_total",
            "Tokens consumed by embedding requests"
        )
    ).expect("Failed to create EMBEDDING_TOKENS counter");
}

static REGISTER: Once = Once::new();

/// Register all metrics with the global registry
///
/// Safe to call more than once; only the first call registers.
pub fn register_metrics() {
    REGISTER.call_once(|| {
        REGISTRY
            .register(Box::new(SEARCH_REQUESTS.clone()))
            .expect("Failed to register SEARCH_REQUESTS");
        REGISTRY
            .register(Box::new(SEARCH_LATENCY.clone()))
            .expect("Failed to register SEARCH_LATENCY");
        REGISTRY
            .register(Box::new(SEARCH_RESULTS.clone()))
            .expect("Failed to register SEARCH_RESULTS");
        REGISTRY
            .register(Box::new(BRANCH_FAILURES.clone()))
            .expect("Failed to register BRANCH_FAILURES");
        REGISTRY
            .register(Box::new(INDEXED_DOCUMENTS.clone()))
            .expect("Failed to register INDEXED_DOCUMENTS");
        REGISTRY
            .register(Box::new(INDEXED_CHUNKS.clone()))
            .expect("Failed to register INDEXED_CHUNKS");
        REGISTRY
            .register(Box::new(EMBEDDING_REQUESTS.clone()))
            .expect("Failed to register EMBEDDING_REQUESTS");
        REGISTRY
            .register(Box::new(EMBEDDING_LATENCY.clone()))
            .expect("Failed to register EMBEDDING_LATENCY");
        REGISTRY
            .register(Box::new(EMBEDDING_TOKENS.clone()))
            .expect("Failed to register EMBEDDING_TOKENS");
    });
}

/// Gather all metrics and encode them in Prometheus text format
///
/// Returns an empty string if encoding fails.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }

    String::from_utf8(buffer).unwrap_or_else(|e| {
        tracing::error!("Metrics contained invalid UTF-8: {}", e);
        String::new()
    })
}

/// Current metric values in a human-readable form, for the `stats` command.
pub struct MetricSnapshot {
    pub search_requests_total: f64,
    pub search_latency_avg: f64,
    pub search_results_avg: f64,
    pub vector_branch_failures: f64,
    pub keyword_branch_failures: f64,
    pub indexed_documents: f64,
    pub indexed_chunks: f64,
    pub embedding_requests_total: f64,
    pub embedding_latency_avg: f64,
    pub embedding_tokens_total: f64,
}

impl MetricSnapshot {
    /// Capture the current state of all metrics
    pub fn capture() -> Self {
        Self {
            search_requests_total: SEARCH_REQUESTS.get(),
            search_latency_avg: calculate_histogram_avg(&SEARCH_LATENCY),
            search_results_avg: calculate_histogram_avg(&SEARCH_RESULTS),
            vector_branch_failures: BRANCH_FAILURES.with_label_values(&["vector"]).get(),
            keyword_branch_failures: BRANCH_FAILURES.with_label_values(&["keyword"]).get(),
            indexed_documents: INDEXED_DOCUMENTS.get(),
            indexed_chunks: INDEXED_CHUNKS.get(),
            embedding_requests_total: EMBEDDING_REQUESTS.get(),
            embedding_latency_avg: calculate_histogram_avg(&EMBEDDING_LATENCY),
            embedding_tokens_total: EMBEDDING_TOKENS.get(),
        }
    }
}

fn calculate_histogram_avg(histogram: &Histogram) -> f64 {
    let count = histogram.get_sample_count();
    if count == 0 {
        return 0.0;
    }
    histogram.get_sample_sum() / count as f64
}
