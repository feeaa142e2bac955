//! Document corpus ingestion.
//!
//! Walks a directory tree of plain-text files and turns each readable file into
//! a [`Document`]. One unreadable file never blocks the rest.

mod loader;

pub use loader::CorpusLoader;

use crate::error::GroundedError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A source document and its full text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Path relative to the corpus root, with `/` separators.
    pub id: String,
    /// Raw document text.
    pub text: String,
}

impl Document {
    /// Create a new document.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Outcome of loading a corpus directory.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Documents that were read successfully.
    pub documents: Vec<Document>,
    /// Files that could not be read, as `DocumentRead` errors.
    pub failures: Vec<GroundedError>,
    /// Readable files that held only whitespace.
    pub skipped: Vec<PathBuf>,
}

impl IngestReport {
    /// Number of candidate files seen.
    pub fn total(&self) -> usize {
        self.documents.len() + self.failures.len() + self.skipped.len()
    }

    /// Number of files read successfully, including skipped empty ones.
    pub fn succeeded(&self) -> usize {
        self.total() - self.failures.len()
    }
}
