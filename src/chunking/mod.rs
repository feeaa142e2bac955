//! Content chunking strategies for breaking documents into retrievable segments.
//!
//! Every strategy first partitions a document into contiguous base segments of at
//! most `max_size - overlap` characters, then prepends the tail of the previous
//! chunk to each following one. Stripping `Chunk::overlap` bytes from every chunk
//! and concatenating therefore reproduces the document exactly.

mod fixed;
mod recursive;

pub use fixed::FixedChunker;
pub use recursive::RecursiveChunker;

use crate::corpus::Document;
use crate::error::{GroundedError, Result};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A bounded, possibly overlapping span of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Id of the source document.
    pub document_id: String,
    /// Position of this chunk within its document.
    pub ordinal: usize,
    /// Byte offset of the chunk start (including the overlap prefix).
    pub start: usize,
    /// Byte offset one past the chunk end.
    pub end: usize,
    /// Byte length of the prefix duplicated from the previous chunk.
    pub overlap: usize,
    /// Literal chunk text.
    pub text: String,
}

impl Chunk {
    /// The chunk text without the prefix shared with the previous chunk.
    pub fn body(&self) -> &str {
        &self.text[self.overlap..]
    }

    /// Length of the chunk text in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Chunking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingStrategy {
    /// Separator-aware recursive splitting.
    #[default]
    Recursive,
    /// Fixed character windows.
    Fixed,
}

impl std::str::FromStr for ChunkingStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recursive" => Ok(ChunkingStrategy::Recursive),
            "fixed" => Ok(ChunkingStrategy::Fixed),
            _ => Err(format!("Unknown chunking strategy: {}", s)),
        }
    }
}

/// Configuration for chunking. Sizes are in characters.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    /// Maximum chunk length.
    pub max_size: usize,
    /// Characters carried over from the previous chunk.
    pub overlap: usize,
    /// Hard-split single words longer than a chunk instead of keeping them whole.
    pub split_long_words: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            overlap: 200,
            split_long_words: false,
        }
    }
}

impl ChunkingConfig {
    /// Create a config, rejecting `overlap >= max_size`.
    pub fn new(max_size: usize, overlap: usize) -> Result<Self> {
        let config = Self {
            max_size,
            overlap,
            split_long_words: false,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(GroundedError::Config(
                "chunk max_size must be greater than zero".to_string(),
            ));
        }
        if self.overlap >= self.max_size {
            return Err(GroundedError::Config(format!(
                "chunk overlap ({}) must be smaller than max_size ({})",
                self.overlap, self.max_size
            )));
        }
        Ok(())
    }

    /// Size available to each base segment once the overlap prefix is added.
    pub fn budget(&self) -> usize {
        self.max_size.saturating_sub(self.overlap).max(1)
    }
}

/// Trait for chunking implementations.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks. An empty document yields no chunks.
    fn split(&self, document: &Document) -> Vec<Chunk>;
}

/// Create a chunker based on the strategy.
pub fn create_chunker(strategy: ChunkingStrategy, config: ChunkingConfig) -> Result<Box<dyn Chunker>> {
    config.validate()?;
    Ok(match strategy {
        ChunkingStrategy::Recursive => Box::new(RecursiveChunker::new(config)),
        ChunkingStrategy::Fixed => Box::new(FixedChunker::new(config)),
    })
}

/// Turn contiguous base segments into chunks carrying the overlap prefix.
pub(crate) fn build_chunks(
    document: &Document,
    segments: &[Range<usize>],
    overlap: usize,
) -> Vec<Chunk> {
    let text = document.text.as_str();
    let mut chunks: Vec<Chunk> = Vec::with_capacity(segments.len());

    for (ordinal, segment) in segments.iter().enumerate() {
        let start = match chunks.last() {
            Some(prev) if overlap > 0 => tail_start(&prev.text, overlap) + prev.start,
            _ => segment.start,
        };

        chunks.push(Chunk {
            document_id: document.id.clone(),
            ordinal,
            start,
            end: segment.end,
            overlap: segment.start - start,
            text: text[start..segment.end].to_string(),
        });
    }

    chunks
}

/// Byte offset within `text` where its last `n` characters begin.
fn tail_start(text: &str, n: usize) -> usize {
    if n == 0 {
        return text.len();
    }
    text.char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}
