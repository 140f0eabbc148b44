//! Service facade exposed to boundary layers (HTTP routes, CLIs, tests).
//!
//! [`RagService`] owns its capability handles outright: everything is
//! constructed once at process start and dropped once at shutdown, with no
//! ambient globals. [`RagServiceHandle`] exists for boundary layers that wire
//! dependencies during startup and need a well-defined "not ready yet"
//! failure instead of a panic.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use crate::chunking;
use crate::completion::CompletionProvider;
use crate::config::RagConfig;
use crate::embeddings::EmbeddingProvider;
use crate::pipeline::{AnswerPipeline, Indexer};
use crate::stores::VectorStore;
use crate::types::{
    AnswerResult, ConversationTurn, HealthReport, HealthState, IndexReport, RagError, Section,
};

/// The fully wired question-answering service.
pub struct RagService {
    config: RagConfig,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    pipeline: AnswerPipeline,
    indexer: Indexer,
}

impl RagService {
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        completer: Arc<dyn CompletionProvider>,
    ) -> Self {
        let pipeline = AnswerPipeline::new(&config, embedder.clone(), store.clone(), completer);
        let indexer = Indexer::new(embedder.clone(), store.clone(), config.batch_size);
        Self {
            config,
            embedder,
            store,
            pipeline,
            indexer,
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Answers a question grounded in the indexed sources.
    pub async fn answer(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<AnswerResult, RagError> {
        self.pipeline.answer(question, history).await
    }

    /// Rebuilds the vector store from the configured source directory.
    pub async fn reindex(&self) -> Result<IndexReport, RagError> {
        self.indexer.index(&self.config.source_dir).await
    }

    /// Rebuilds the vector store from an explicit directory.
    pub async fn reindex_from(&self, source_dir: &Path) -> Result<IndexReport, RagError> {
        self.indexer.index(source_dir).await
    }

    /// Chunks a Markdown document; exposed for tooling and tests.
    pub fn chunk(&self, markdown: &str) -> Vec<Section> {
        chunking::chunk_markdown(markdown)
    }

    /// Number of documents currently held by the vector store.
    pub async fn document_count(&self) -> Result<usize, RagError> {
        self.store.count().await
    }

    /// Probes the vector store and the embedding capability.
    pub async fn health(&self) -> HealthReport {
        let store_status = match self.store.count().await {
            Ok(_) => HealthState::Healthy,
            Err(err) => {
                error!(%err, "store health probe failed");
                HealthState::Unhealthy
            }
        };
        let llm_status = match self.embedder.embed("health check").await {
            Ok(_) => HealthState::Healthy,
            Err(err) => {
                error!(%err, "embedding health probe failed");
                HealthState::Unhealthy
            }
        };
        let status = if store_status == HealthState::Healthy && llm_status == HealthState::Healthy
        {
            HealthState::Healthy
        } else {
            HealthState::Unhealthy
        };
        HealthReport {
            status,
            store_status,
            llm_status,
            checked_at: Utc::now(),
        }
    }
}

/// Deferred wiring around [`RagService`].
///
/// Calls made before [`initialize`](Self::initialize) fail with
/// [`RagError::NotInitialized`] rather than panicking, giving boundary
/// layers a clean startup-ordering contract.
#[derive(Default)]
pub struct RagServiceHandle {
    inner: Option<Arc<RagService>>,
}

impl RagServiceHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn initialize(&mut self, service: RagService) {
        info!("rag service initialized");
        self.inner = Some(Arc::new(service));
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.is_some()
    }

    /// Shared handle to the wired service.
    pub fn service(&self) -> Result<Arc<RagService>, RagError> {
        self.inner.clone().ok_or(RagError::NotInitialized {
            component: "rag service",
        })
    }

    pub async fn answer(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<AnswerResult, RagError> {
        self.service()?.answer(question, history).await
    }

    pub async fn reindex(&self) -> Result<IndexReport, RagError> {
        self.service()?.reindex().await
    }

    pub async fn health(&self) -> HealthReport {
        match &self.inner {
            Some(service) => service.health().await,
            None => HealthReport {
                status: HealthState::NotInitialized,
                store_status: HealthState::NotInitialized,
                llm_status: HealthState::NotInitialized,
                checked_at: Utc::now(),
            },
        }
    }
}
