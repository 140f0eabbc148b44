//! Embedding capability: trait, OpenAI-compatible HTTP client, and a
//! deterministic mock.
//!
//! The pipeline only ever sees [`EmbeddingProvider`]; which implementation
//! sits behind it is wired at process start. The mock is exported because
//! integration tests and offline tooling need deterministic vectors without a
//! network dependency.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::redact;
use crate::types::RagError;

/// Produces dense vector representations of text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError>;

    /// Embeds a batch of texts in one capability call, preserving input
    /// order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError>;
}

/// Client for an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbeddings {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbeddings {
    pub const DEFAULT_MODEL: &'static str = "text-embedding-3-small";
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: Self::DEFAULT_MODEL.to_string(),
        }
    }

    /// Builds a client from `OPENAI_API_KEY` (resolving `.env` files first).
    pub fn from_env() -> Result<Self, RagError> {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| RagError::NotInitialized {
            component: "embedding provider (OPENAI_API_KEY)",
        })?;
        Ok(Self::new(api_key))
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the API base URL, e.g. for a proxy or a test server.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        let body = EmbeddingsRequest {
            model: &self.model,
            input,
        };
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| self.dependency_error(&err.to_string()))?;

        let payload: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|err| self.dependency_error(&err.to_string()))?;

        let mut data = payload.data;
        data.sort_by_key(|item| item.index);
        Ok(data.into_iter().map(|item| item.embedding).collect())
    }

    fn dependency_error(&self, raw: &str) -> RagError {
        let message = redact::sanitize(raw, &[&self.api_key]);
        error!(provider = "embeddings", %message, "embedding request failed");
        RagError::Dependency {
            provider: "embeddings",
            message,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddings {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        let input = [text.to_string()];
        let mut vectors = self.request(&input).await?;
        vectors.pop().ok_or_else(|| RagError::Dependency {
            provider: "embeddings",
            message: "response contained no embeddings".to_string(),
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let vectors = self.request(texts).await?;
        if vectors.len() != texts.len() {
            return Err(RagError::Dependency {
                provider: "embeddings",
                message: format!(
                    "expected {} embeddings, received {}",
                    texts.len(),
                    vectors.len()
                ),
            });
        }
        Ok(vectors)
    }
}

/// Deterministic embedding provider for tests and offline tooling.
///
/// Vectors are derived from a per-dimension hash of the input text and
/// normalized to unit length, so identical texts always map to identical
/// vectors and distinct texts rarely collide. Each `embed`/`embed_batch`
/// invocation counts as one capability call, observable via [`calls`].
///
/// [`calls`]: MockEmbeddingProvider::calls
pub struct MockEmbeddingProvider {
    dimensions: usize,
    calls: AtomicUsize,
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbeddingProvider {
    pub const DEFAULT_DIMENSIONS: usize = 8;

    pub fn new() -> Self {
        Self {
            dimensions: Self::DEFAULT_DIMENSIONS,
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions.max(1);
        self
    }

    /// Number of capability calls made so far (batch calls count once).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        use std::hash::{DefaultHasher, Hash, Hasher};

        let mut vector: Vec<f32> = (0..self.dimensions)
            .map(|dimension| {
                let mut hasher = DefaultHasher::new();
                dimension.hash(&mut hasher);
                text.hash(&mut hasher);
                // Map the hash onto [-1, 1].
                (hasher.finish() % 2_000_001) as f32 / 1_000_000.0 - 1.0
            })
            .collect();

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RagError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, RagError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|text| self.vector_for(text)).collect())
    }
}
