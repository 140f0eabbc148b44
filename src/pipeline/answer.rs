//! The per-question answer pipeline.
//!
//! One request walks a fixed sequence: validate, fold history, embed,
//! retrieve, assemble context, prompt, complete. Both caches are consulted
//! before their respective capability call; the embedding is computed (or
//! cache-served) even when the retrieval result is already cached, so a
//! freshly warmed embedding stays available for future alternate queries.
//!
//! Requests for the same question may race and each populate the caches;
//! last writer wins, which is harmless because values derive
//! deterministically from the same input.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use crate::cache::TtlCache;
use crate::completion::CompletionProvider;
use crate::config::RagConfig;
use crate::embeddings::EmbeddingProvider;
use crate::stores::VectorStore;
use crate::types::{AnswerResult, ConversationTurn, RagError, RetrievalResult, Role};

/// Placeholder rendered when no usable conversation history is supplied.
pub const NO_HISTORY: &str = "(none)";

/// Fixed refusal the model is instructed to produce when the context lacks
/// the answer.
pub const REFUSAL: &str =
    "I'm sorry, I can't answer that because it isn't covered by my source material.";

/// Coordinates caches and capabilities into one deterministic request flow.
pub struct AnswerPipeline {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    completer: Arc<dyn CompletionProvider>,
    embedding_cache: TtlCache<String, Vec<f32>>,
    retrieval_cache: TtlCache<String, RetrievalResult>,
    top_k: usize,
}

impl AnswerPipeline {
    pub fn new(
        config: &RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        completer: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            embedder,
            store,
            completer,
            embedding_cache: TtlCache::new(config.embedding_cache),
            retrieval_cache: TtlCache::new(config.retrieval_cache),
            top_k: config.top_k,
        }
    }

    /// Answers `question` grounded in retrieved context.
    ///
    /// Fails with [`RagError::InvalidInput`] before any capability call when
    /// the question is empty after trimming; capability failures propagate as
    /// [`RagError::Dependency`].
    pub async fn answer(
        &self,
        question: &str,
        history: &[ConversationTurn],
    ) -> Result<AnswerResult, RagError> {
        let started = Instant::now();

        let normalized = question.trim();
        if normalized.is_empty() {
            return Err(RagError::InvalidInput("question is empty".to_string()));
        }
        let cache_key = normalized.to_string();

        let history_block = fold_history(history);

        let embedding = match self.embedding_cache.get(&cache_key) {
            Some(vector) => {
                debug!("embedding cache hit");
                vector
            }
            None => {
                let vector = self.embedder.embed(normalized).await?;
                self.embedding_cache.set(cache_key.clone(), vector.clone());
                vector
            }
        };

        let retrieval = match self.retrieval_cache.get(&cache_key) {
            Some(result) => {
                debug!("retrieval cache hit");
                result
            }
            None => {
                let result = self.store.query(&embedding, self.top_k).await?;
                self.retrieval_cache.set(cache_key, result.clone());
                result
            }
        };

        let (context, sources) = assemble_context(&retrieval);
        let prompt = build_prompt(normalized, &history_block, &context);
        let answer = self.completer.complete(&prompt, 0.0).await?;

        let generated_at = Utc::now();
        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(sources = sources.len(), elapsed_ms, "answer generated");

        Ok(AnswerResult {
            answer,
            sources,
            generated_at,
            elapsed_ms,
        })
    }
}

/// Renders conversation history into a single block.
///
/// Each turn with non-empty content becomes `"User: <content>"` or
/// `"Assistant: <content>"`, concatenated in order with no separator. The
/// exact format is load-bearing for downstream prompt parsing.
pub(crate) fn fold_history(history: &[ConversationTurn]) -> String {
    let mut rendered = String::new();
    for turn in history {
        if turn.content.is_empty() {
            continue;
        }
        let prefix = match turn.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
        };
        rendered.push_str(prefix);
        rendered.push_str(": ");
        rendered.push_str(&turn.content);
    }
    if rendered.is_empty() {
        NO_HISTORY.to_string()
    } else {
        rendered
    }
}

/// Formats retrieved documents into labeled context blocks and source labels.
///
/// Missing metadata falls back to `"Unknown"`; `heading_path` falls back to
/// `heading` first. Sources keep retrieval order and may repeat.
pub(crate) fn assemble_context(retrieval: &RetrievalResult) -> (String, Vec<String>) {
    let mut context = String::new();
    let mut sources = Vec::with_capacity(retrieval.documents.len());
    for (document, metadata) in retrieval.documents.iter().zip(&retrieval.metadata) {
        let file = metadata.file.as_deref().unwrap_or("Unknown");
        let heading = metadata.heading.as_deref().unwrap_or("Unknown");
        let heading_path = metadata.heading_path.as_deref().unwrap_or(heading);

        context.push_str(&format!(
            "\n[FILE: {file}] [SECTION: {heading_path}]\n{document}\n"
        ));
        sources.push(format!("{file} - {heading_path}"));
    }
    (context, sources)
}

fn build_prompt(question: &str, history: &str, context: &str) -> String {
    format!(
        "You are an assistant who answers questions based solely on the experience \
captured in the context below.

# Constraints
- Ground every statement in the \"Context\" section and nothing else.
- If the context does not contain the answer, reply exactly: {REFUSAL}
- When the question contains referring words such as \"that\", \"it\", or \"there\", \
resolve them against the conversation history before answering.

# Question
{question}

# Context

## Conversation history
{history}

## Document excerpts
{context}

# Answer:
"
    )
}
