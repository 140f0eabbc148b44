//! # Ragmark: Markdown-grounded Question Answering
//!
//! Ragmark is the core of a retrieval-augmented QA backend: it chunks a tree
//! of Markdown sources into breadcrumbed sections, indexes them into a vector
//! store, and answers questions with completions grounded strictly in the
//! retrieved excerpts.
//!
//! ```text
//! Markdown tree ──► chunking::chunk_directory ──► breadcrumbed chunks
//!                                    │
//!                                    ▼
//!               pipeline::Indexer (embed in batches, full replace)
//!                                    │
//!                                    ▼
//!                        stores::VectorStore backend
//!                                    ▲
//!                                    │ top-k cosine retrieval
//! Question + history ──► pipeline::AnswerPipeline ──► grounded prompt
//!                          │ TTL+LRU caches          │
//!                          ▼                         ▼
//!               embeddings::EmbeddingProvider   completion::CompletionProvider
//! ```
//!
//! ## Quick Start
//!
//! Wire the capabilities once at startup and hand the service to your
//! boundary layer:
//!
//! ```no_run
//! use std::sync::Arc;
//! use ragmark::{
//!     InMemoryVectorStore, OpenAiCompletions, OpenAiEmbeddings, RagConfig, RagService,
//! };
//!
//! # async fn wire() -> Result<(), ragmark::RagError> {
//! let config = RagConfig::default();
//! let service = RagService::new(
//!     config,
//!     Arc::new(OpenAiEmbeddings::from_env()?),
//!     Arc::new(InMemoryVectorStore::new()),
//!     Arc::new(OpenAiCompletions::from_env()?),
//! );
//!
//! service.reindex().await?;
//! let result = service.answer("How do I deploy?", &[]).await?;
//! println!("{}", result.answer);
//! # Ok(())
//! # }
//! ```
//!
//! Tests and local tooling swap in the bundled mocks
//! ([`MockEmbeddingProvider`], [`MockCompletionProvider`]) and the in-memory
//! store; nothing in the pipeline knows the difference.

pub mod cache;
pub mod chunking;
pub mod completion;
pub mod config;
pub mod embeddings;
pub mod pipeline;
pub mod redact;
pub mod service;
pub mod stores;
pub mod types;

pub use cache::TtlCache;
pub use chunking::{chunk_directory, chunk_file, chunk_markdown};
pub use completion::{CompletionProvider, MockCompletionProvider, OpenAiCompletions};
pub use config::{CacheSettings, RagConfig};
pub use embeddings::{EmbeddingProvider, MockEmbeddingProvider, OpenAiEmbeddings};
pub use pipeline::{AnswerPipeline, Indexer};
pub use service::{RagService, RagServiceHandle};
pub use stores::{InMemoryVectorStore, VectorRecord, VectorStore};
pub use types::{
    AnswerResult, Chunk, ConversationTurn, DocumentMetadata, HealthReport, HealthState,
    IndexReport, IndexStatus, RagError, RetrievalResult, Role, Section,
};
