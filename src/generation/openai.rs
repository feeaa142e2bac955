//! OpenAI-compatible chat completion backend.

use super::{CompletionBackend, CompletionRequest};
use crate::error::{GroundedError, Result};
use crate::openai::create_client;
use async_openai::types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs};
use async_trait::async_trait;
use std::time::Duration;
use tracing::instrument;

/// Chat completion backend for any OpenAI-compatible API.
pub struct OpenAIBackend {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
}

impl OpenAIBackend {
    /// Create a backend for `base_url` authenticated with `api_key`.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: create_client(base_url, api_key, timeout)?,
        })
    }
}

#[async_trait]
impl CompletionBackend for OpenAIBackend {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(request.prompt.clone())
            .build()
            .map_err(|e| GroundedError::GenerationBackend(e.to_string()))?;

        #[allow(deprecated)]
        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(&request.model)
            .messages(vec![message.into()])
            .temperature(request.temperature)
            .max_tokens(request.max_tokens)
            .build()
            .map_err(|e| GroundedError::GenerationBackend(e.to_string()))?;

        let response = self.client.chat().create(chat_request).await.map_err(|e| {
            GroundedError::GenerationBackend(format!("Failed to generate response: {}", e))
        })?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GroundedError::GenerationBackend("Empty response from LLM".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_backend_is_generation_error() {
        let backend = OpenAIBackend::new("http://127.0.0.1:9/v1", "key", Duration::from_secs(1)).unwrap();
        let request = CompletionRequest {
            model: "gpt-4o-mini".to_string(),
            prompt: "hello".to_string(),
            temperature: 0.3,
            max_tokens: 16,
        };

        let err = backend.complete(&request).await.unwrap_err();
        assert!(matches!(err, GroundedError::GenerationBackend(_)));
    }
}
