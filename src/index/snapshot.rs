//! Serializable index snapshots.

use super::{FlatIndex, IndexEntry, VectorIndex};
use crate::error::{GroundedError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A built index plus the metadata needed to reuse it safely.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub version: u32,
    /// Embedding model that produced the vectors.
    pub model: String,
    pub dimensions: Option<usize>,
    pub built_at: DateTime<Utc>,
    pub entries: Vec<IndexEntry>,
}

impl IndexSnapshot {
    pub fn new(model: &str, index: &FlatIndex) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            model: model.to_string(),
            dimensions: index.dimensions(),
            built_at: Utc::now(),
            entries: index.entries().to_vec(),
        }
    }

    pub(crate) fn check_version(&self) -> Result<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(GroundedError::IndexBuild(format!(
                "unsupported snapshot version {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }
        Ok(())
    }

    /// Check that this snapshot was produced by a compatible embedder.
    pub fn check_compatible(&self, model: &str, dimensions: usize) -> Result<()> {
        if self.model != model {
            return Err(GroundedError::IndexBuild(format!(
                "snapshot was built with model '{}', current embedder is '{}'",
                self.model, model
            )));
        }
        if let Some(dim) = self.dimensions {
            if dim != dimensions {
                return Err(GroundedError::IndexBuild(format!(
                    "snapshot has {} dimensions, current embedder produces {}",
                    dim, dimensions
                )));
            }
        }
        Ok(())
    }

    /// Rebuild the searchable index, re-validating every vector.
    pub fn into_index(self) -> Result<FlatIndex> {
        let index = FlatIndex::build(self.entries)?;
        if index.dimensions() != self.dimensions {
            return Err(GroundedError::IndexBuild(format!(
                "snapshot header claims {:?} dimensions, entries have {:?}",
                self.dimensions,
                index.dimensions()
            )));
        }
        Ok(index)
    }
}
