//! Request-time and indexing-time orchestration.
//!
//! * [`answer`] — the per-question pipeline: validate, fold history, embed
//!   (cached), retrieve (cached), assemble a grounded prompt, complete.
//! * [`index`] — the offline pipeline: chunk a Markdown tree, embed in
//!   batches, and rebuild the vector store under an exclusive run lock.

pub mod answer;
pub mod index;

pub use answer::{AnswerPipeline, NO_HISTORY, REFUSAL};
pub use index::Indexer;
