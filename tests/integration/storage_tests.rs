use anyhow::Result;

use docrag::config::SearchMode;
use docrag::embeddings::ProviderType;
use docrag::storage::{DocumentStore, InMemoryStore, ScopeFilter, Snapshot};
use docrag::Config;

use crate::helpers::test_harness::{sample_corpus, TestHarness};

#[tokio::test]
async fn test_snapshot_round_trip_preserves_index() -> Result<()> {
    let harness = TestHarness::new()?;
    harness.index(sample_corpus()).await?;

    let path = harness.path().join("store.json");
    harness.store.snapshot().await.save(&path)?;

    let restored = InMemoryStore::from_snapshot(Snapshot::load(&path)?);
    assert_eq!(restored.document_count().await, harness.store.document_count().await);
    assert_eq!(restored.chunk_count().await, harness.store.chunk_count().await);

    let original = harness.store.get_document("budget").await?.unwrap();
    let loaded = restored.get_document("budget").await?.unwrap();
    assert_eq!(loaded.embedding, original.embedding);
    assert_eq!(loaded.tags, original.tags);

    let chunks = restored
        .list_chunks_with_embeddings(&ScopeFilter::scope("team-a"))
        .await?;
    assert!(chunks.iter().any(|chunk| chunk.document_id == "budget"));

    Ok(())
}

#[tokio::test]
async fn test_missing_snapshot_loads_empty() -> Result<()> {
    let harness = TestHarness::new()?;

    let snapshot = Snapshot::load(&harness.path().join("absent.json"))?;

    assert!(snapshot.documents.is_empty());
    assert!(snapshot.chunks.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_cli_workflow_with_hash_provider() -> Result<()> {
    let harness = TestHarness::new()?;
    let root = harness.path();

    docrag::commands::init::run(root, false).await?;
    assert!(Config::is_initialized(root));
    assert!(docrag::commands::init::run(root, false).await.is_err());

    let mut config = Config::load(root)?;
    config.embeddings.provider = ProviderType::Hash;
    config.embeddings.dimension = 64;
    config.embeddings.batch_delay_ms = 0;
    config.search.mode = SearchMode::Keyword;
    config.save(root)?;

    let mut corpus = sample_corpus();
    corpus[0].id = String::new();
    let corpus_path = root.join("corpus.json");
    std::fs::write(&corpus_path, serde_json::to_string(&corpus)?)?;

    docrag::commands::index::run(root, &corpus_path).await?;

    let snapshot = Snapshot::load(&config.snapshot_path(root))?;
    assert_eq!(snapshot.documents.len(), 5);
    assert!(snapshot.documents.iter().all(|doc| !doc.id.is_empty()));
    assert!(snapshot.documents.iter().all(|doc| doc.embedding.is_some()));

    docrag::commands::search::run(root, "marketing budget", None, Some(3), None).await?;
    docrag::commands::search::run(root, "marketing", Some(SearchMode::Hybrid), None, None)
        .await?;
    docrag::commands::similar::run(root, "hiring", None, Some(0.0), None).await?;
    docrag::commands::status::run(root, Some("team-a".to_string())).await?;
    docrag::commands::stats::run(root, false).await?;

    Ok(())
}

#[test]
fn test_config_round_trip() -> Result<()> {
    let dir = tempfile::tempdir()?;

    let mut config = Config::default();
    config.search.vector_weight = 0.5;
    config.search.mode = SearchMode::Vector;
    config.embeddings.api_key = "${DOCRAG_TEST_KEY}".to_string();
    config.save(dir.path())?;

    let loaded = Config::load(dir.path())?;
    assert_eq!(loaded.search.mode, SearchMode::Vector);
    assert!((loaded.search.vector_weight - 0.5).abs() < f32::EPSILON);
    assert_eq!(loaded.embeddings.api_key, "${DOCRAG_TEST_KEY}");
    assert_eq!(loaded.storage.snapshot_path, "store.json");

    Ok(())
}
