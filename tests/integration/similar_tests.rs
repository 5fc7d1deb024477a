use anyhow::Result;

use docrag::search::{SearchError, SimilarOptions};

use crate::helpers::test_harness::{document, sample_corpus, TestHarness};

#[tokio::test]
async fn test_identical_embeddings_score_one() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.index(sample_corpus()).await?;
    let engine = harness.engine();

    let results = engine
        .find_similar("budget", &SimilarOptions::default())
        .await?;

    // Archived and off-topic documents drop out; the source is never returned
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["budget-events"]);
    assert!((results[0].similarity - 1.0).abs() < 1e-6);

    Ok(())
}

#[tokio::test]
async fn test_similar_spans_scopes_unless_restricted() -> Result<()> {
    let harness = TestHarness::new()?;
    let mut corpus = sample_corpus();
    corpus.push(document(
        "other-scope-budget",
        "Budget forecast",
        "Spend forecast for next year.",
        "team-b",
    ));
    harness.index(corpus).await?;
    let engine = harness.engine();

    let results = engine
        .find_similar("budget", &SimilarOptions::default())
        .await?;
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["budget-events", "other-scope-budget"]);

    let team_a = SimilarOptions {
        scope_id: Some("team-a".to_string()),
        ..SimilarOptions::default()
    };
    let results = engine.find_similar("budget", &team_a).await?;
    assert!(results.iter().all(|r| r.id != "other-scope-budget"));

    Ok(())
}

#[tokio::test]
async fn test_unembedded_source_falls_back_to_keywords() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.index(sample_corpus()).await?;

    let mut draft = document("draft", "Hiring budget", "", "team-a");
    draft.summary = Some("Interview loop costs".to_string());
    harness.store.upsert_document(draft).await;

    let engine = harness.engine();
    let results = engine
        .find_similar("draft", &SimilarOptions::default())
        .await?;

    assert!(!results.is_empty());
    assert!(results.len() <= SimilarOptions::default().limit);
    assert!(results.iter().all(|r| r.id != "draft"));
    assert!(results.iter().any(|r| r.id == "hiring"));

    Ok(())
}

#[tokio::test]
async fn test_unknown_document_is_reported() -> Result<()> {
    let harness = TestHarness::new()?;
    let engine = harness.engine();

    let err = engine
        .find_similar("missing", &SimilarOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<SearchError>(),
        Some(SearchError::DocumentNotFound(id)) if id == "missing"
    ));

    Ok(())
}
