//! Local hashed n-gram embeddings.

use super::Embedder;
use crate::error::{GroundedError, Result};
use async_trait::async_trait;
use std::collections::HashMap;

const MODEL_ID: &str = "hashed-ngram-v1";

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "where", "who", "how", "does", "do", "did",
];

/// Deterministic in-process embedder.
///
/// Hashes whole words and their character trigrams into a fixed number of
/// buckets and normalizes the result to a unit vector. It has no notion of
/// synonyms, but shared vocabulary between a question and a chunk is enough to
/// rank small corpora, and it needs neither a network nor model files.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// Create a new hashing embedder with the given dimensions.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(GroundedError::Config(
                "embedding dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(Self { dimensions })
    }

    fn bucket(&self, feature: &str, seed: u64) -> usize {
        // FNV-1a
        let hash = feature.bytes().fold(0xcbf29ce484222325u64 ^ seed, |acc, b| {
            (acc ^ b as u64).wrapping_mul(0x100000001b3)
        });
        (hash % self.dimensions as u64) as usize
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();

        let mut word_freq: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 1 && !STOP_WORDS.contains(w))
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            embedding[self.bucket(word, 0)] += *freq as f32;

            let padded: Vec<char> = format!(" {} ", word).chars().collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                embedding[self.bucket(&trigram, 1)] += 0.5 * (*freq as f32).sqrt();
            }
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        MODEL_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::cosine_similarity;

    #[tokio::test]
    async fn test_unit_length_and_dimensions() {
        let embedder = HashingEmbedder::new(256).unwrap();
        let v = embedder.embed("Ownership and borrowing in Rust").await.unwrap();

        assert_eq!(v.len(), 256);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let embedder = HashingEmbedder::new(128).unwrap();
        let a = embedder.embed("deterministic test").await.unwrap();
        let b = embedder.embed("deterministic test").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_empty_text_is_zero_vector() {
        let embedder = HashingEmbedder::new(64).unwrap();
        let v = embedder.embed("").await.unwrap();
        assert!(v.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_higher() {
        let embedder = HashingEmbedder::new(384).unwrap();
        let query = embedder.embed("Where is the Zorblax dialect spoken?").await.unwrap();
        let related = embedder
            .embed("The Zorblax dialect is spoken in the floating city of Velmora.")
            .await
            .unwrap();
        let unrelated = embedder
            .embed("Bread rises because yeast ferments sugar into gas.")
            .await
            .unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_batch_matches_single() {
        let embedder = HashingEmbedder::new(128).unwrap();
        let texts = vec!["first text".to_string(), "second text".to_string()];
        let batch = embedder.embed_batch(&texts).await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[1], embedder.embed("second text").await.unwrap());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(HashingEmbedder::new(0).is_err());
    }
}
