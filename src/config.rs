//! Configuration for the ragmark pipeline.
//!
//! All knobs live in one explicit [`RagConfig`] value that is constructed at
//! process start and handed to the service; there is no ambient global state.
//! The source directory can be resolved from the environment (via `.env`
//! files) the same way other defaults are in this codebase.

use std::path::PathBuf;
use std::time::Duration;

/// Sizing and expiry for one [`TtlCache`](crate::cache::TtlCache) instance.
///
/// A zero `max_size` or zero `ttl` disables the cache entirely: it never
/// stores, and every lookup misses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheSettings {
    pub max_size: usize,
    pub ttl: Duration,
}

impl CacheSettings {
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self { max_size, ttl }
    }

    /// Settings that turn the cache into a no-op.
    pub fn disabled() -> Self {
        Self {
            max_size: 0,
            ttl: Duration::ZERO,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.max_size == 0 || self.ttl.is_zero()
    }
}

/// Top-level configuration for [`RagService`](crate::service::RagService).
#[derive(Clone, Debug)]
pub struct RagConfig {
    /// Directory holding the Markdown knowledge sources.
    pub source_dir: PathBuf,
    /// Number of documents retrieved per question.
    pub top_k: usize,
    /// Chunks embedded and upserted per batch during indexing.
    pub batch_size: usize,
    /// Cache for question-text -> embedding vector.
    pub embedding_cache: CacheSettings,
    /// Cache for question-text -> retrieval result.
    pub retrieval_cache: CacheSettings,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            source_dir: Self::resolve_source_dir(None),
            top_k: 3,
            batch_size: 10,
            embedding_cache: CacheSettings::new(256, Duration::from_secs(600)),
            retrieval_cache: CacheSettings::new(128, Duration::from_secs(300)),
        }
    }
}

impl RagConfig {
    fn resolve_source_dir(provided: Option<PathBuf>) -> PathBuf {
        if let Some(dir) = provided {
            return dir;
        }
        dotenvy::dotenv().ok();
        std::env::var("RAGMARK_SOURCE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("information_source"))
    }

    pub fn new(source_dir: Option<PathBuf>) -> Self {
        Self {
            source_dir: Self::resolve_source_dir(source_dir),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = dir.into();
        self
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    #[must_use]
    pub fn with_embedding_cache(mut self, settings: CacheSettings) -> Self {
        self.embedding_cache = settings;
        self
    }

    #[must_use]
    pub fn with_retrieval_cache(mut self, settings: CacheSettings) -> Self {
        self.retrieval_cache = settings;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_contract() {
        let config = RagConfig::default();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.batch_size, 10);
        assert!(!config.embedding_cache.is_disabled());
        assert!(!config.retrieval_cache.is_disabled());
    }

    #[test]
    fn zero_size_or_zero_ttl_disables_cache() {
        assert!(CacheSettings::new(0, Duration::from_secs(60)).is_disabled());
        assert!(CacheSettings::new(16, Duration::ZERO).is_disabled());
        assert!(!CacheSettings::new(16, Duration::from_secs(60)).is_disabled());
        assert!(CacheSettings::disabled().is_disabled());
    }

    #[test]
    fn builder_methods_override_defaults() {
        let config = RagConfig::default()
            .with_source_dir("docs")
            .with_top_k(5)
            .with_retrieval_cache(CacheSettings::disabled());
        assert_eq!(config.source_dir, PathBuf::from("docs"));
        assert_eq!(config.top_k, 5);
        assert!(config.retrieval_cache.is_disabled());
    }
}
