//! Answer generation against a remote chat completion backend.
//!
//! [`GenerationClient`] never propagates backend faults: every failure comes
//! back as [`Completion::Failed`], which renders as an `[error]`-prefixed string.

mod openai;

pub use openai::OpenAIBackend;

use crate::config::GenerationSettings;
use crate::error::{GroundedError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Marker prefixed to answers produced from a failure.
pub const ERROR_MARKER: &str = "[error]";

/// Typed call configuration for the completion backend.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::from(&GenerationSettings::default())
    }
}

impl From<&GenerationSettings> for GenerationConfig {
    fn from(settings: &GenerationSettings) -> Self {
        Self {
            model: settings.model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// A single-turn completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    /// Content of the one `user` message.
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// A chat completion backend.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Return the primary completion text for `request`.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Result of a generation call.
#[derive(Debug)]
pub enum Completion {
    Text(String),
    Failed(GroundedError),
}

impl Completion {
    pub fn is_failed(&self) -> bool {
        matches!(self, Completion::Failed(_))
    }

    /// Render as answer text, prefixing failures with [`ERROR_MARKER`].
    pub fn into_text(self) -> String {
        match self {
            Completion::Text(text) => text,
            Completion::Failed(e) => format!("{} {}", ERROR_MARKER, e),
        }
    }
}

/// Sends assembled prompts to a completion backend.
#[derive(Clone)]
pub struct GenerationClient {
    backend: Arc<dyn CompletionBackend>,
    config: GenerationConfig,
}

impl GenerationClient {
    pub fn new(backend: Arc<dyn CompletionBackend>, config: GenerationConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Override the model, keeping the rest of the configuration.
    pub fn with_model(mut self, model: &str) -> Self {
        self.config.model = model.to_string();
        self
    }

    /// Generate an answer for `prompt`. Never fails; see [`Completion`].
    #[instrument(skip(self, prompt), fields(model = %self.config.model, prompt_chars = prompt.chars().count()))]
    pub async fn generate(&self, prompt: &str) -> Completion {
        let request = CompletionRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let outcome = match tokio::time::timeout(self.config.timeout, self.backend.complete(&request)).await {
            Ok(Ok(text)) if text.trim().is_empty() => Err(GroundedError::GenerationBackend(
                "backend returned an empty completion".to_string(),
            )),
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e @ GroundedError::GenerationBackend(_))) => Err(e),
            Ok(Err(e)) => Err(GroundedError::GenerationBackend(e.to_string())),
            Err(_) => Err(GroundedError::GenerationBackend(format!(
                "request timed out after {}s",
                self.config.timeout.as_secs_f32()
            ))),
        };

        match outcome {
            Ok(text) => {
                debug!("Generated {} chars", text.len());
                Completion::Text(text)
            }
            Err(e) => {
                warn!("Generation failed: {}", e);
                Completion::Failed(e)
            }
        }
    }
}
