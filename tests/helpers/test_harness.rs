use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use docrag::embeddings::{EmbeddingClient, EmbeddingClientConfig};
use docrag::indexer::{Chunker, IndexingPipeline, IndexingReport};
use docrag::search::SearchEngine;
use docrag::storage::InMemoryStore;
use docrag::text::RichTextFlattener;
use docrag::{Config, Document, DocumentStatus};

use super::topic_embeddings::TopicProvider;

pub struct TestHarness {
    pub temp_dir: TempDir,
    pub store: Arc<InMemoryStore>,
    pub provider: Arc<TopicProvider>,
    pub client: Arc<EmbeddingClient>,
    pub config: Config,
}

impl TestHarness {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let config = Config::default();
        let provider = Arc::new(TopicProvider::new());
        let client = Arc::new(EmbeddingClient::new(
            provider.clone(),
            EmbeddingClientConfig {
                model: "topic-model".to_string(),
                batch_size: 4,
                batch_delay: Duration::ZERO,
                max_input_chars: 4000,
            },
        ));

        Ok(Self {
            temp_dir,
            store: Arc::new(InMemoryStore::new()),
            provider,
            client,
            config,
        })
    }

    pub fn pipeline(&self) -> IndexingPipeline {
        IndexingPipeline::new(
            Chunker::new(self.config.chunker.clone()),
            self.client.clone(),
            Arc::new(RichTextFlattener),
        )
    }

    pub async fn index(&self, documents: Vec<Document>) -> Result<IndexingReport> {
        self.pipeline().index_into(&self.store, documents).await
    }

    pub fn engine(&self) -> SearchEngine {
        SearchEngine::new(
            self.store.clone(),
            Arc::new(RichTextFlattener),
            self.config.search.clone(),
        )
        .with_embeddings(self.client.clone())
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }
}

pub fn document(id: &str, title: &str, body: &str, scope: &str) -> Document {
    let mut doc = Document::new(id, title);
    doc.body = Some(body.to_string());
    doc.scope_id = Some(scope.to_string());
    doc
}

/// Five documents over three topics and two scopes, one of them archived.
pub fn sample_corpus() -> Vec<Document> {
    let mut budget = document(
        "budget",
        "Marketing budget review",
        "The marketing budget covers paid campaigns and events.",
        "team-a",
    );
    budget.summary = Some("Quarterly marketing spend".to_string());
    budget.tags.insert("finance".to_string());

    let events = document(
        "budget-events",
        "Events budget",
        "Conference spend and travel.",
        "team-a",
    );

    let mut hiring = document(
        "hiring",
        "Hiring plan",
        "Each candidate meets four interviewers.",
        "team-a",
    );
    hiring.summary = Some("Interview loop for engineers".to_string());

    let roadmap = document(
        "roadmap",
        "Product roadmap",
        "Milestones for the next release.",
        "team-b",
    );

    let mut archived = document(
        "archived-budget",
        "Old marketing budget",
        "Last year's marketing budget.",
        "team-a",
    );
    archived.status = DocumentStatus::Archived;

    vec![budget, events, hiring, roadmap, archived]
}
