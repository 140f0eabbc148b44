//! The indexing pipeline: Markdown tree in, rebuilt vector store out.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::chunking;
use crate::embeddings::EmbeddingProvider;
use crate::stores::{VectorRecord, VectorStore};
use crate::types::{Chunk, DocumentMetadata, IndexReport, IndexStatus, RagError};

/// Rebuilds a vector store collection from a directory of Markdown files.
///
/// Every run is a full replace: existing entries are deleted before the new
/// chunks are embedded and upserted in fixed-size batches.
pub struct Indexer {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    batch_size: usize,
    run_lock: Mutex<()>,
}

impl Indexer {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        batch_size: usize,
    ) -> Self {
        Self {
            embedder,
            store,
            batch_size: batch_size.max(1),
            run_lock: Mutex::new(()),
        }
    }

    /// Runs one indexing pass over `source_dir`.
    ///
    /// The run lock is held for the whole enumerate-delete-upsert sequence,
    /// so two runs never interleave on the same store. Retrieval reads during
    /// a run may observe a transiently empty or partially rebuilt store;
    /// that is an accepted trade-off of the full-replace strategy.
    pub async fn index(&self, source_dir: &Path) -> Result<IndexReport, RagError> {
        let _guard = self.run_lock.lock().await;
        let run_id = Uuid::new_v4();
        info!(%run_id, dir = %source_dir.display(), "indexing run started");

        // Chunking walks the filesystem; keep it off the async workers.
        let dir = source_dir.to_path_buf();
        let chunks = tokio::task::spawn_blocking(move || chunking::chunk_directory(&dir))
            .await
            .map_err(|err| RagError::Chunking(err.to_string()))?;

        if chunks.is_empty() {
            warn!(%run_id, "no chunks found; store left untouched");
            return Ok(IndexReport {
                status: IndexStatus::Warning,
                message: "No chunks found".to_string(),
                chunks_processed: 0,
            });
        }

        self.clear_existing(run_id).await;

        let mut processed = 0usize;
        for (batch_number, batch) in chunks.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.content.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;

            let records: Vec<VectorRecord> = batch
                .iter()
                .zip(embeddings)
                .enumerate()
                .map(|(offset, (chunk, embedding))| VectorRecord {
                    id: format!("chunk-{}", processed + offset),
                    document: chunk.content.clone(),
                    embedding,
                    metadata: metadata_for(chunk),
                })
                .collect();

            self.store.upsert(records).await?;
            processed += batch.len();
            info!(%run_id, batch = batch_number + 1, processed, "indexed batch");
        }

        info!(%run_id, processed, "indexing run complete");
        Ok(IndexReport {
            status: IndexStatus::Success,
            message: format!("Indexed {processed} chunks"),
            chunks_processed: processed,
        })
    }

    /// Deletes whatever the collection currently holds.
    ///
    /// Failures here are logged and swallowed: a stale entry that survives
    /// the clear is overwritten or orphaned by the upserts that follow, which
    /// is preferable to failing the whole rebuild.
    async fn clear_existing(&self, run_id: Uuid) {
        match self.store.all_ids().await {
            Ok(ids) if ids.is_empty() => {}
            Ok(ids) => match self.store.delete(&ids).await {
                Ok(removed) => info!(%run_id, removed, "cleared existing entries"),
                Err(err) => warn!(%run_id, %err, "failed to clear existing entries"),
            },
            Err(err) => warn!(%run_id, %err, "failed to enumerate existing entries"),
        }
    }
}

fn metadata_for(chunk: &Chunk) -> DocumentMetadata {
    DocumentMetadata {
        file: Some(chunk.source_file.clone()),
        heading: Some(
            chunk
                .heading
                .clone()
                .unwrap_or_else(|| chunking::INTRODUCTION.to_string()),
        ),
        heading_path: Some(chunk.heading_path.clone()),
    }
}
