use anyhow::Result;

use docrag::config::SearchMode;
use docrag::embeddings::codec;
use docrag::search::{ResultKind, SearchRequest};
use docrag::storage::{DocumentStore, ScopeFilter};

use crate::helpers::test_harness::{sample_corpus, TestHarness};
use crate::helpers::topic_embeddings::TOPIC_DIMENSION;

#[tokio::test]
async fn test_index_embeds_documents_and_chunks() -> Result<()> {
    let harness = TestHarness::new()?;

    let report = harness.index(sample_corpus()).await?;

    assert_eq!(report.documents_indexed, 5);
    assert!(report.chunks_created >= 5);
    assert_eq!(report.chunks_embedded, report.chunks_created);
    assert!(report.total_tokens > 0);

    let documents = harness.store.list_active_documents(&ScopeFilter::all()).await?;
    assert_eq!(documents.len(), 4);
    for document in &documents {
        let vector = codec::parse(document.embedding.as_deref()).expect("document embedding");
        assert_eq!(vector.len(), TOPIC_DIMENSION);
    }

    let chunks = harness
        .store
        .list_chunks_with_embeddings(&ScopeFilter::scope("team-b"))
        .await?;
    assert!(!chunks.is_empty());
    assert!(chunks.iter().all(|chunk| chunk.document_id == "roadmap"));

    Ok(())
}

#[tokio::test]
async fn test_vector_search_ranks_by_topic() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.index(sample_corpus()).await?;
    let engine = harness.engine();

    let results = engine
        .search(&SearchRequest::new("marketing budget"), SearchMode::Vector)
        .await?;

    let ids: Vec<&str> = results.iter().map(|r| r.document_id.as_str()).collect();
    assert_eq!(ids, vec!["budget", "budget-events"]);
    assert!((results[0].similarity - 1.0).abs() < 1e-6);
    assert_eq!(results[0].kind, ResultKind::Document);

    Ok(())
}

#[tokio::test]
async fn test_keyword_search_prefers_title_matches() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.index(sample_corpus()).await?;
    let engine = harness.engine();

    let results = engine
        .search(&SearchRequest::new("marketing budget"), SearchMode::Keyword)
        .await?;

    assert_eq!(results[0].id, "budget");
    assert!(results.iter().all(|r| r.id != "archived-budget"));
    assert!(results[0].similarity > results[1].similarity);

    Ok(())
}

#[tokio::test]
async fn test_hybrid_search_normalizes_top_result() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.index(sample_corpus()).await?;
    let engine = harness.engine();

    let results = engine
        .search(&SearchRequest::new("marketing budget"), SearchMode::Hybrid)
        .await?;

    assert_eq!(results[0].id, "budget");
    assert!((results[0].similarity - 1.0).abs() < 1e-6);
    assert!(results
        .windows(2)
        .all(|pair| pair[0].similarity >= pair[1].similarity));
    assert_eq!(results[0].metadata.vector_rank, Some(1));
    assert_eq!(results[0].metadata.keyword_rank, Some(1));

    Ok(())
}

#[tokio::test]
async fn test_search_respects_scope_and_limit() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.index(sample_corpus()).await?;
    let engine = harness.engine();

    let request = SearchRequest {
        query: "release milestones".to_string(),
        scope_id: Some("team-b".to_string()),
        limit: Some(1),
    };
    let results = engine.search(&request, SearchMode::Hybrid).await?;

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document_id, "roadmap");

    Ok(())
}

#[tokio::test]
async fn test_availability_counts_embedded_documents() -> Result<()> {
    let harness = TestHarness::new()?;
    let engine = harness.engine();

    let empty = engine.availability(&ScopeFilter::all()).await?;
    assert!(!empty.available);
    assert_eq!(empty.total_count, 0);

    harness.index(sample_corpus()).await?;
    let mut unembedded = docrag::Document::new("draft", "Draft notes");
    unembedded.scope_id = Some("team-a".to_string());
    harness.store.upsert_document(unembedded).await;

    let team_a = engine.availability(&ScopeFilter::scope("team-a")).await?;
    assert!(team_a.available);
    assert_eq!(team_a.embedded_count, 3);
    assert_eq!(team_a.total_count, 4);

    let missing = engine.availability(&ScopeFilter::scope("team-z")).await?;
    assert!(!missing.available);

    Ok(())
}
