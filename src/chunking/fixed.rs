//! Fixed-window chunking implementation.
//!
//! Splits documents into windows of a fixed number of characters, ignoring
//! separators. Useful for text without reliable punctuation or line breaks.

use super::{build_chunks, Chunk, Chunker, ChunkingConfig};
use crate::corpus::Document;

/// Fixed-size character window chunker.
pub struct FixedChunker {
    config: ChunkingConfig,
}

impl FixedChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }
}

impl Default for FixedChunker {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

impl Chunker for FixedChunker {
    fn split(&self, document: &Document) -> Vec<Chunk> {
        let text = document.text.as_str();
        if text.is_empty() {
            return Vec::new();
        }

        let budget = self.config.budget();
        let mut segments = Vec::new();
        let mut start = 0;
        let mut count = 0;

        for (i, _) in text.char_indices() {
            if count == budget {
                segments.push(start..i);
                start = i;
                count = 0;
            }
            count += 1;
        }
        segments.push(start..text.len());

        build_chunks(document, &segments, self.config.overlap)
    }
}
