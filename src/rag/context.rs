//! Retrieval of context chunks for a question.

use crate::embedding::{embed_with_timeout, Embedder};
use crate::error::{GroundedError, Result};
use crate::index::{SearchResult, VectorIndex};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Embeds questions and looks up the closest chunks in the index.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    top_k: usize,
    min_score: f32,
    timeout: Duration,
}

impl Retriever {
    /// Create a new retriever with `top_k = 3` and no score threshold.
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            index,
            embedder,
            top_k: 3,
            min_score: 0.0,
            timeout: Duration::from_secs(60),
        }
    }

    /// Set the default number of chunks to retrieve.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the minimum similarity score threshold.
    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    /// Set the timeout for embedding the question.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve up to `k` chunks for `question`, best first.
    #[instrument(skip(self), fields(k = k))]
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Vec<SearchResult>> {
        let query = embed_with_timeout(self.timeout, self.embedder.embed(question))
            .await
            .and_then(|r| r)?;

        let results = self
            .index
            .search_with_threshold(&query, k, self.min_score)
            .map_err(|e| match e {
                GroundedError::Retrieval(_) => e,
                other => GroundedError::Retrieval(other.to_string()),
            })?;

        debug!(
            "Retrieved {} chunks (top score {:?})",
            results.len(),
            results.first().map(|r| r.score)
        );
        Ok(results)
    }
}
