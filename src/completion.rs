//! Completion capability: trait, OpenAI-compatible chat client, and a
//! scripted mock.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::redact;
use crate::types::RagError;

/// Turns an assembled prompt into answer text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, RagError>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiCompletions {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl OpenAiCompletions {
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";
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
            component: "completion provider (OPENAI_API_KEY)",
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

    fn dependency_error(&self, raw: &str) -> RagError {
        let message = redact::sanitize(raw, &[&self.api_key]);
        error!(provider = "completion", %message, "completion request failed");
        RagError::Dependency {
            provider: "completion",
            message,
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompletions {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, RagError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature,
        };
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| self.dependency_error(&err.to_string()))?;

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|err| self.dependency_error(&err.to_string()))?;

        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RagError::Dependency {
                provider: "completion",
                message: "response contained no choices".to_string(),
            })
    }
}

/// Canned completion provider for tests.
///
/// Replies with a fixed string, records every prompt it receives, and counts
/// capability calls.
pub struct MockCompletionProvider {
    reply: String,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockCompletionProvider {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl CompletionProvider for MockCompletionProvider {
    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, RagError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}
