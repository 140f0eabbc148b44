//! Core data model and error taxonomy for the ragmark pipeline.
//!
//! Everything here is plain data: produced once, never mutated, and safe to
//! hand across the boundary layer. The [`RagError`] taxonomy is deliberately
//! small so callers can map each variant to a distinct user-visible failure
//! category without leaking internal detail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A retrievable unit of a source document, tagged with heading context.
///
/// `content` already carries the breadcrumb text of ancestor headings, so a
/// chunk embeds and retrieves well even when it sits deep in a document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// File stem of the source document.
    pub source_file: String,
    /// Heading the chunk belongs to; `None` only for content preceding any
    /// heading in its document.
    pub heading: Option<String>,
    /// Display path for the chunk's section; `"Introduction"` when the chunk
    /// has no heading.
    pub heading_path: String,
    /// Breadcrumb context plus the chunk's own body.
    pub content: String,
}

/// Per-document chunker output, before a source file is attributed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub heading: Option<String>,
    pub content: String,
}

/// Speaker role for a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One prior exchange in the conversation, supplied by the caller per request
/// and never persisted by the core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Attributes stored alongside a document in the vector store.
///
/// All fields are optional on the way out of the store; defaults are applied
/// at context-assembly time, not here.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading_path: Option<String>,
}

/// Ranked documents plus aligned metadata as returned by the vector store.
///
/// `documents` and `metadata` are always length-aligned and ordered by
/// descending relevance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub documents: Vec<String>,
    pub metadata: Vec<DocumentMetadata>,
}

/// Final answer returned to the boundary layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    /// `"<file> - <heading_path>"` labels in retrieval order; duplicates
    /// allowed.
    pub sources: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

/// Outcome classification for an indexing run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexStatus {
    Success,
    Warning,
}

/// Summary of one indexing run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexReport {
    pub status: IndexStatus,
    pub message: String,
    pub chunks_processed: usize,
}

/// Health of one probed component, or of the service overall.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Unhealthy,
    NotInitialized,
}

/// Result of probing the service's external dependencies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthState,
    pub store_status: HealthState,
    pub llm_status: HealthState,
    pub checked_at: DateTime<Utc>,
}

/// Errors surfaced by the ragmark core.
///
/// `Dependency` messages are redacted at the provider boundary before they are
/// constructed, so `Display` output is always safe to log or return verbatim.
#[derive(Debug, Error)]
pub enum RagError {
    /// The caller supplied input the pipeline cannot work with; recoverable by
    /// correcting the request.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A pipeline was invoked before its dependencies were wired; a
    /// programming error at the boundary layer.
    #[error("{component} is not initialized")]
    NotInitialized { component: &'static str },

    /// An underlying capability call (embedding, vector store, completion)
    /// failed. The message has already been scrubbed of known secrets.
    #[error("dependency '{provider}' failed: {message}")]
    Dependency {
        provider: &'static str,
        message: String,
    },

    /// Filesystem error outside the per-file skip path.
    #[error("io error: {0}")]
    Io(String),

    /// Chunk enumeration failed as a whole (not a per-file skip).
    #[error("chunking error: {0}")]
    Chunking(String),
}

impl From<std::io::Error> for RagError {
    fn from(err: std::io::Error) -> Self {
        RagError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn unknown_role_is_rejected_at_the_boundary() {
        let result: Result<ConversationTurn, _> =
            serde_json::from_str(r#"{"role":"system","content":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn metadata_fields_default_to_none() {
        let meta: DocumentMetadata = serde_json::from_str(r#"{"file":"y.md"}"#).unwrap();
        assert_eq!(meta.file.as_deref(), Some("y.md"));
        assert!(meta.heading.is_none());
        assert!(meta.heading_path.is_none());
    }

    #[test]
    fn error_display_is_user_readable() {
        let err = RagError::Dependency {
            provider: "embeddings",
            message: "connection refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "dependency 'embeddings' failed: connection refused"
        );

        let err = RagError::NotInitialized {
            component: "rag service",
        };
        assert_eq!(err.to_string(), "rag service is not initialized");
    }
}
