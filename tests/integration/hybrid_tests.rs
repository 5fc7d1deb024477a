use anyhow::Result;
use std::sync::Arc;

use docrag::config::SearchMode;
use docrag::embeddings::EmbeddingError;
use docrag::metrics::BRANCH_FAILURES;
use docrag::search::{
    HybridSearch, KeywordSearch, RrfFusion, Search, SearchError, SearchQuery, SearchRequest,
};
use docrag::text::RichTextFlattener;

use crate::helpers::test_harness::{sample_corpus, TestHarness};
use crate::helpers::topic_embeddings::FailingSearch;

fn keyword_search(harness: &TestHarness) -> Arc<KeywordSearch> {
    Arc::new(KeywordSearch::new(
        harness.store.clone(),
        Arc::new(RichTextFlattener),
        harness.config.search.excerpt_chars,
    ))
}

#[tokio::test]
async fn test_failed_vector_branch_degrades_to_keyword_ranking() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.index(sample_corpus()).await?;

    let keyword = keyword_search(&harness);
    let hybrid = HybridSearch::new(Arc::new(FailingSearch), keyword.clone(), RrfFusion::default());
    let query = SearchQuery::new("marketing budget", 10);

    let before = BRANCH_FAILURES.with_label_values(&["vector"]).get();
    let fused = hybrid.search(&query).await?;
    let keyword_only = keyword.search(&query).await?;

    let fused_ids: Vec<&str> = fused.iter().map(|r| r.id.as_str()).collect();
    let keyword_ids: Vec<&str> = keyword_only.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(fused_ids, keyword_ids);
    assert!((fused[0].similarity - 1.0).abs() < 1e-6);
    assert!(fused.iter().all(|r| r.metadata.vector_rank.is_none()));
    assert!(BRANCH_FAILURES.with_label_values(&["vector"]).get() >= before + 1.0);

    Ok(())
}

#[tokio::test]
async fn test_both_branches_failing_is_an_error() -> Result<()> {
    let hybrid = HybridSearch::new(
        Arc::new(FailingSearch),
        Arc::new(FailingSearch),
        RrfFusion::default(),
    );

    let err = hybrid
        .search(&SearchQuery::new("anything", 5))
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SearchError>(),
        Some(SearchError::AllBranchesFailed { .. })
    ));

    Ok(())
}

#[tokio::test]
async fn test_provider_outage_keeps_hybrid_search_alive() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.index(sample_corpus()).await?;
    let engine = harness.engine();

    harness.provider.set_failing(true);

    let results = engine
        .search(&SearchRequest::new("hiring plan"), SearchMode::Hybrid)
        .await?;
    assert_eq!(results[0].id, "hiring");

    let err = engine
        .search(&SearchRequest::new("hiring plan"), SearchMode::Vector)
        .await
        .unwrap_err();
    assert!(err
        .chain()
        .any(|cause| cause.downcast_ref::<EmbeddingError>().is_some()));

    Ok(())
}

#[tokio::test]
async fn test_keyword_only_engine_rejects_semantic_modes() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.index(sample_corpus()).await?;
    let engine = docrag::search::SearchEngine::new(
        harness.store.clone(),
        Arc::new(RichTextFlattener),
        harness.config.search.clone(),
    );

    let keyword = engine
        .search(&SearchRequest::new("roadmap"), SearchMode::Keyword)
        .await?;
    assert_eq!(keyword[0].id, "roadmap");

    let err = engine
        .search(&SearchRequest::new("roadmap"), SearchMode::Hybrid)
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SearchError>(),
        Some(SearchError::SemanticUnavailable(_))
    ));

    Ok(())
}
