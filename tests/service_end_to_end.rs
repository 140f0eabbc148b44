//! End-to-end tests over the wired service with mock capabilities: index a
//! real temporary Markdown tree, then answer questions against it.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::tempdir;

use ragmark::{
    ConversationTurn, DocumentMetadata, EmbeddingProvider, InMemoryVectorStore, IndexStatus,
    MockCompletionProvider, MockEmbeddingProvider, RagConfig, RagError, RagService,
    RetrievalResult, VectorRecord, VectorStore,
};

/// Wraps the in-memory store to count similarity queries.
struct CountingStore {
    inner: InMemoryVectorStore,
    queries: AtomicUsize,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: InMemoryVectorStore::new(),
            queries: AtomicUsize::new(0),
        }
    }

    fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorStore for CountingStore {
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<RetrievalResult, RagError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.inner.query(embedding, top_k).await
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), RagError> {
        self.inner.upsert(records).await
    }

    async fn delete(&self, ids: &[String]) -> Result<usize, RagError> {
        self.inner.delete(ids).await
    }

    async fn all_ids(&self) -> Result<Vec<String>, RagError> {
        self.inner.all_ids().await
    }

    async fn count(&self) -> Result<usize, RagError> {
        self.inner.count().await
    }
}

struct Harness {
    embedder: Arc<MockEmbeddingProvider>,
    store: Arc<CountingStore>,
    completer: Arc<MockCompletionProvider>,
    service: RagService,
}

fn harness() -> Harness {
    let embedder = Arc::new(MockEmbeddingProvider::new());
    let store = Arc::new(CountingStore::new());
    let completer = Arc::new(MockCompletionProvider::new("grounded answer"));
    let service = RagService::new(
        RagConfig::default(),
        embedder.clone(),
        store.clone(),
        completer.clone(),
    );
    Harness {
        embedder,
        store,
        completer,
        service,
    }
}

#[tokio::test]
async fn index_then_answer_round_trip() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("a.md"), "# Title\nBody text").unwrap();

    let h = harness();
    let report = h.service.reindex_from(dir.path()).await.unwrap();
    assert_eq!(report.status, IndexStatus::Success);
    assert_eq!(report.chunks_processed, 1);
    assert_eq!(h.service.document_count().await.unwrap(), 1);

    let result = h.service.answer("What is the title?", &[]).await.unwrap();
    assert_eq!(result.answer, "grounded answer");
    assert_eq!(result.sources, vec!["a - Title"]);

    let prompt = h.completer.prompts().pop().unwrap();
    assert!(prompt.contains("[FILE: a] [SECTION: Title]"));
    assert!(prompt.contains("Body text"));
    assert!(prompt.contains("What is the title?"));
}

#[tokio::test]
async fn repeated_question_hits_both_caches() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("a.md"), "# Title\nBody text").unwrap();

    let h = harness();
    h.service.reindex_from(dir.path()).await.unwrap();
    let indexing_embed_calls = h.embedder.calls();
    let indexing_queries = h.store.queries();

    h.service.answer("What is X?", &[]).await.unwrap();
    h.service.answer("What is X?", &[]).await.unwrap();

    // Second answer is served from the embedding and retrieval caches; only
    // the completion runs again.
    assert_eq!(h.embedder.calls() - indexing_embed_calls, 1);
    assert_eq!(h.store.queries() - indexing_queries, 1);
    assert_eq!(h.completer.calls(), 2);
}

#[tokio::test]
async fn blank_questions_fail_before_any_capability_call() {
    let h = harness();
    for question in ["", "   ", "\n\t"] {
        let err = h.service.answer(question, &[]).await.unwrap_err();
        assert!(matches!(err, RagError::InvalidInput(_)), "{question:?}");
    }
    assert_eq!(h.embedder.calls(), 0);
    assert_eq!(h.store.queries(), 0);
    assert_eq!(h.completer.calls(), 0);
}

#[tokio::test]
async fn sources_apply_metadata_defaults_in_retrieval_order() {
    let h = harness();
    let question = "Which section covers setup?";

    // Seed the store directly: one record aligned with the question's
    // embedding, one opposed, so retrieval order is deterministic.
    let aligned = h.embedder.embed(question).await.unwrap();
    let opposed: Vec<f32> = aligned.iter().map(|v| -v).collect();
    h.store
        .upsert(vec![
            VectorRecord {
                id: "a".to_string(),
                document: "first doc".to_string(),
                embedding: aligned,
                metadata: DocumentMetadata {
                    file: Some("x.md".to_string()),
                    heading: None,
                    heading_path: Some("Intro".to_string()),
                },
            },
            VectorRecord {
                id: "b".to_string(),
                document: "second doc".to_string(),
                embedding: opposed,
                metadata: DocumentMetadata::default(),
            },
        ])
        .await
        .unwrap();

    let result = h.service.answer(question, &[]).await.unwrap();
    assert_eq!(result.sources, vec!["x.md - Intro", "Unknown - Unknown"]);
}

#[tokio::test]
async fn prompt_reflects_conversation_history() {
    let h = harness();

    h.service.answer("First question?", &[]).await.unwrap();
    let history = vec![
        ConversationTurn::user("First question?"),
        ConversationTurn::assistant("grounded answer"),
    ];
    h.service
        .answer("And what about that?", &history)
        .await
        .unwrap();

    let prompts = h.completer.prompts();
    assert!(prompts[0].contains("(none)"));
    assert!(prompts[1].contains("User: First question?Assistant: grounded answer"));
    assert!(!prompts[1].contains("(none)"));
}
