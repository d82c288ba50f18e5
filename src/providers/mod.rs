/*!
 * Text generation providers.
 *
 * The translation pipeline only needs two capabilities from a model backend:
 * turning a system + user prompt into text, and making sure a model is
 * installed before the first call.
 * - Ollama: Local LLM server
 * - Mock: Scripted provider for tests
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Model options sent with every generation call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Context window in tokens
    pub num_ctx: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Top-k sampling
    pub top_k: u32,
    /// Nucleus sampling threshold
    pub top_p: f32,
    /// Repetition penalty window, -1 for the whole context
    pub repeat_last_n: i32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            num_ctx: 8192,
            temperature: 0.7,
            top_k: 40,
            top_p: 0.9,
            repeat_last_n: 64,
        }
    }
}

/// A single prompt-in, text-out exchange
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Model name
    pub model: String,
    /// System prompt
    pub system: String,
    /// User prompt
    pub prompt: String,
    /// Model options
    pub options: GenerationOptions,
    /// Prompt category name, e.g. `article_worker`
    pub task: String,
    /// The text being worked on (section content, frontmatter JSON, document)
    pub input: String,
}

impl GenerationRequest {
    /// Create a request with default options
    pub fn new(model: impl Into<String>, system: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system: system.into(),
            prompt: prompt.into(),
            options: GenerationOptions::default(),
            task: String::new(),
            input: String::new(),
        }
    }

    /// Label the request with its prompt category and subject text
    pub fn with_task(mut self, task: impl Into<String>, input: impl Into<String>) -> Self {
        self.task = task.into();
        self.input = input.into();
        self
    }

    /// Whether this request asks a critic for a verdict
    pub fn is_critic(&self) -> bool {
        self.task.ends_with("_critic")
    }

    /// Set the model options
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }
}

/// Common trait for all text generation backends
///
/// Errors returned by [`Provider::generate`] are treated as transient by the
/// translation pipeline and consume one attempt of the retry budget.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Generate a completion for the request
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError>;

    /// Make sure the model is available, fetching it if needed.
    ///
    /// Must be idempotent; repeated calls for a verified model should be cheap.
    async fn ensure_model(&self, model: &str) -> Result<(), ProviderError>;
}

pub mod mock;
pub mod ollama;

pub use mock::MockProvider;
pub use ollama::Ollama;
