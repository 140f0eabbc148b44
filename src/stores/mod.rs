//! Vector store capability and the in-memory reference backend.
//!
//! The pipeline works against the [`VectorStore`] trait; real deployments
//! supply a backend for their database of choice, while tests, tooling, and
//! small corpora use [`InMemoryVectorStore`].
//!
//! ```text
//!                  ┌──────────────────┐
//!                  │ VectorStore trait│
//!                  │   (async CRUD)   │
//!                  └────────┬─────────┘
//!                           │
//!              ┌────────────┴────────────┐
//!              ▼                         ▼
//!     ┌─────────────────┐        ┌─────────────┐
//!     │    InMemory     │        │  (external) │
//!     │ cosine ranking  │        │   backends  │
//!     └─────────────────┘        └─────────────┘
//! ```

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::types::{DocumentMetadata, RagError, RetrievalResult};

/// A document plus its embedding and metadata, ready for storage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Identifier unique within the collection.
    pub id: String,
    /// The chunk text as it will be retrieved.
    pub document: String,
    pub embedding: Vec<f32>,
    pub metadata: DocumentMetadata,
}

/// Capability interface over whatever vector database backs the service.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Ranked similarity query; most similar first, at most `top_k` results.
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<RetrievalResult, RagError>;

    /// Inserts records, replacing any with matching ids.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), RagError>;

    /// Removes the given ids, returning how many records were deleted.
    async fn delete(&self, ids: &[String]) -> Result<usize, RagError>;

    /// Ids of every record in the collection.
    async fn all_ids(&self) -> Result<Vec<String>, RagError>;

    /// Total number of records in the collection.
    async fn count(&self) -> Result<usize, RagError>;
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Cosine-similarity store backed by a plain in-memory vector.
///
/// Suitable for tests and small corpora; linear scan per query.
#[derive(Default)]
pub struct InMemoryVectorStore {
    records: RwLock<Vec<VectorRecord>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<RetrievalResult, RagError> {
        let records = self.records.read();
        let mut scored: Vec<(f32, &VectorRecord)> = records
            .iter()
            .map(|record| (cosine_similarity(embedding, &record.embedding), record))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        Ok(RetrievalResult {
            documents: scored
                .iter()
                .map(|(_, record)| record.document.clone())
                .collect(),
            metadata: scored
                .iter()
                .map(|(_, record)| record.metadata.clone())
                .collect(),
        })
    }

    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), RagError> {
        let mut stored = self.records.write();
        for record in records {
            match stored.iter_mut().find(|existing| existing.id == record.id) {
                Some(existing) => *existing = record,
                None => stored.push(record),
            }
        }
        Ok(())
    }

    async fn delete(&self, ids: &[String]) -> Result<usize, RagError> {
        let mut stored = self.records.write();
        let before = stored.len();
        stored.retain(|record| !ids.contains(&record.id));
        Ok(before - stored.len())
    }

    async fn all_ids(&self) -> Result<Vec<String>, RagError> {
        Ok(self
            .records
            .read()
            .iter()
            .map(|record| record.id.clone())
            .collect())
    }

    async fn count(&self) -> Result<usize, RagError> {
        Ok(self.records.read().len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, embedding: Vec<f32>) -> VectorRecord {
        VectorRecord {
            id: id.to_string(),
            document: format!("doc {id}"),
            embedding,
            metadata: DocumentMetadata {
                file: Some(format!("{id}.md")),
                heading: None,
                heading_path: None,
            },
        }
    }

    #[tokio::test]
    async fn query_ranks_by_cosine_similarity() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![
                record("aligned", vec![1.0, 0.0]),
                record("orthogonal", vec![0.0, 1.0]),
                record("opposed", vec![-1.0, 0.0]),
            ])
            .await
            .unwrap();

        let result = store.query(&[1.0, 0.0], 2).await.unwrap();
        assert_eq!(result.documents, vec!["doc aligned", "doc orthogonal"]);
        assert_eq!(result.metadata.len(), 2);
        assert_eq!(result.metadata[0].file.as_deref(), Some("aligned.md"));
    }

    #[tokio::test]
    async fn query_on_empty_store_returns_nothing() {
        let store = InMemoryVectorStore::new();
        let result = store.query(&[1.0, 0.0], 3).await.unwrap();
        assert!(result.documents.is_empty());
        assert!(result.metadata.is_empty());
    }

    #[tokio::test]
    async fn upsert_replaces_matching_ids() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![record("a", vec![1.0, 0.0])])
            .await
            .unwrap();
        let mut replacement = record("a", vec![0.0, 1.0]);
        replacement.document = "replaced".to_string();
        store.upsert(vec![replacement]).await.unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let result = store.query(&[0.0, 1.0], 1).await.unwrap();
        assert_eq!(result.documents, vec!["replaced"]);
    }

    #[tokio::test]
    async fn delete_removes_only_named_ids() {
        let store = InMemoryVectorStore::new();
        store
            .upsert(vec![
                record("a", vec![1.0, 0.0]),
                record("b", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let removed = store.delete(&["a".to_string()]).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.all_ids().await.unwrap(), vec!["b"]);
    }

    #[test]
    fn zero_vectors_have_zero_similarity() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
    }
}
