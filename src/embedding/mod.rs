//! Embedding generation for semantic search and retrieval.

mod hashing;
mod openai;

pub use hashing::HashingEmbedder;
pub use openai::OpenAIEmbedder;

use crate::config::{EmbeddingProvider, EmbeddingSettings};
use crate::error::{GroundedError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Identifier of the model producing the vectors.
    fn model_id(&self) -> &str;
}

/// Create an embedder from settings.
///
/// `api_key` is only used by remote providers.
pub fn create_embedder(settings: &EmbeddingSettings, api_key: Option<&str>) -> Result<Arc<dyn Embedder>> {
    let dimensions = settings.dimensions as usize;
    Ok(match settings.provider {
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedder::new(dimensions)?),
        EmbeddingProvider::OpenAI => Arc::new(OpenAIEmbedder::new(
            &settings.base_url,
            api_key.unwrap_or_default(),
            &settings.model,
            dimensions,
            Duration::from_secs(settings.timeout_secs),
        )?),
    })
}

/// Run an embedding call under a timeout, reporting expiry as an unavailable model.
pub async fn embed_with_timeout<F>(timeout: Duration, call: F) -> Result<F::Output>
where
    F: std::future::Future,
{
    tokio::time::timeout(timeout, call).await.map_err(|_| {
        GroundedError::ModelUnavailable(format!(
            "embedding call timed out after {}s",
            timeout.as_secs_f32()
        ))
    })
}

/// Check that every vector has the expected dimensionality.
pub(crate) fn check_dimensions(vectors: &[Vec<f32>], expected: usize) -> Result<()> {
    if let Some(bad) = vectors.iter().find(|v| v.len() != expected) {
        return Err(GroundedError::ModelUnavailable(format!(
            "model returned a {}-dimensional vector, expected {}",
            bad.len(),
            expected
        )));
    }
    Ok(())
}
