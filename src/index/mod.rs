//! Vector index abstraction for Grounded.
//!
//! An index is built once from a complete set of embedded chunks and is
//! read-only afterwards, so concurrent searches need no locking.

mod flat;
mod snapshot;

pub use flat::FlatIndex;
pub use snapshot::{IndexSnapshot, SNAPSHOT_VERSION};

use crate::chunking::Chunk;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A chunk paired with its embedding vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    pub fn new(chunk: Chunk, embedding: Vec<f32>) -> Self {
        Self { chunk, embedding }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk.
    pub chunk: Chunk,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Trait for vector index implementations.
pub trait VectorIndex: Send + Sync {
    /// Return up to `k` entries most similar to `query`, best first.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>>;

    /// Like [`search`](Self::search), dropping results scoring below `min_score`.
    fn search_with_threshold(&self, query: &[f32], k: usize, min_score: f32) -> Result<Vec<SearchResult>> {
        let mut results = self.search(query, k)?;
        results.retain(|r| r.score >= min_score);
        Ok(results)
    }

    /// Number of entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimensionality, or `None` for an empty index.
    fn dimensions(&self) -> Option<usize>;
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
