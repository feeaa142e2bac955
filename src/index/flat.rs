//! Exhaustive in-memory vector index.

use super::{cosine_similarity, IndexEntry, IndexSnapshot, SearchResult, VectorIndex};
use crate::error::{GroundedError, Result};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Brute-force cosine index over a fixed set of entries.
///
/// Entries keep their insertion order, which breaks score ties.
#[derive(Debug, Clone, Default)]
pub struct FlatIndex {
    entries: Vec<IndexEntry>,
    dimensions: Option<usize>,
}

impl FlatIndex {
    /// Build an index from a complete set of entries.
    ///
    /// All vectors must share one non-zero dimensionality.
    pub fn build(entries: Vec<IndexEntry>) -> Result<Self> {
        let dimensions = match entries.first() {
            Some(first) if first.embedding.is_empty() => {
                return Err(GroundedError::IndexBuild(
                    "embedding vectors must not be empty".to_string(),
                ));
            }
            Some(first) => Some(first.embedding.len()),
            None => None,
        };

        if let Some(dim) = dimensions {
            if let Some((i, bad)) = entries
                .iter()
                .enumerate()
                .find(|(_, e)| e.embedding.len() != dim)
            {
                return Err(GroundedError::IndexBuild(format!(
                    "entry {} ({}#{}) has {} dimensions, expected {}",
                    i,
                    bad.chunk.document_id,
                    bad.chunk.ordinal,
                    bad.embedding.len(),
                    dim
                )));
            }
        }

        debug!("Built flat index with {} entries", entries.len());
        Ok(Self { entries, dimensions })
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Write the index to `path` as a JSON snapshot tagged with `model`.
    pub fn save(&self, path: &Path, model: &str) -> Result<()> {
        let snapshot = IndexSnapshot::new(model, self);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = std::io::BufWriter::new(std::fs::File::create(path)?);
        serde_json::to_writer(&mut writer, &snapshot)?;
        writer.flush()?;
        info!("Saved index snapshot ({} entries) to {}", self.len(), path.display());
        Ok(())
    }

    /// Read a snapshot written by [`save`](Self::save).
    pub fn load(path: &Path) -> Result<IndexSnapshot> {
        let file = std::io::BufReader::new(std::fs::File::open(path)?);
        let snapshot: IndexSnapshot = serde_json::from_reader(file)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }
}

impl VectorIndex for FlatIndex {
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>> {
        let Some(dim) = self.dimensions else {
            return Ok(Vec::new());
        };
        if query.len() != dim {
            return Err(GroundedError::Retrieval(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                dim
            )));
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let score = cosine_similarity(query, &e.embedding);
                (i, if score.is_nan() { f32::NEG_INFINITY } else { score })
            })
            .collect();

        // Stable: equal scores keep insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| SearchResult {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;

    fn entry(id: &str, ordinal: usize, embedding: Vec<f32>) -> IndexEntry {
        IndexEntry::new(
            Chunk {
                document_id: id.to_string(),
                ordinal,
                start: 0,
                end: 4,
                overlap: 0,
                text: format!("{id}-{ordinal}"),
            },
            embedding,
        )
    }

    fn sample_index() -> FlatIndex {
        FlatIndex::build(vec![
            entry("a", 0, vec![1.0, 0.0, 0.0]),
            entry("b", 0, vec![0.0, 1.0, 0.0]),
            entry("c", 0, vec![0.7, 0.7, 0.0]),
            entry("d", 0, vec![0.0, 0.0, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_search_orders_by_score() {
        let index = sample_index();
        let results = index.search(&[1.0, 0.1, 0.0], 3).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk.document_id, "a");
        assert_eq!(results[1].chunk.document_id, "c");
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_search_never_exceeds_index_size() {
        let index = sample_index();
        assert_eq!(index.search(&[1.0, 0.0, 0.0], 10).unwrap().len(), 4);
        assert_eq!(index.search(&[1.0, 0.0, 0.0], 0).unwrap().len(), 0);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = FlatIndex::build(vec![
            entry("first", 0, vec![1.0, 0.0]),
            entry("second", 0, vec![1.0, 0.0]),
            entry("third", 0, vec![1.0, 0.0]),
        ])
        .unwrap();

        let ids: Vec<String> = index
            .search(&[1.0, 0.0], 3)
            .unwrap()
            .into_iter()
            .map(|r| r.chunk.document_id)
            .collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_empty_index_returns_empty() {
        let index = FlatIndex::build(Vec::new()).unwrap();
        assert!(index.is_empty());
        assert!(index.search(&[1.0, 2.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_mixed_dimensions_rejected() {
        let result = FlatIndex::build(vec![entry("a", 0, vec![1.0, 0.0]), entry("b", 0, vec![1.0])]);
        assert!(matches!(result, Err(GroundedError::IndexBuild(_))));

        let result = FlatIndex::build(vec![entry("a", 0, vec![])]);
        assert!(matches!(result, Err(GroundedError::IndexBuild(_))));
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let index = sample_index();
        let result = index.search(&[1.0, 0.0], 2);
        assert!(matches!(result, Err(GroundedError::Retrieval(_))));
    }

    #[test]
    fn test_threshold_filters() {
        let index = sample_index();
        let results = index.search_with_threshold(&[1.0, 0.0, 0.0], 4, 0.5).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.chunk.document_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_save_and_load_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/index.json");

        let index = sample_index();
        index.save(&path, "test-model").unwrap();

        let snapshot = FlatIndex::load(&path).unwrap();
        assert_eq!(snapshot.model, "test-model");
        assert_eq!(snapshot.dimensions, Some(3));

        let restored = snapshot.into_index().unwrap();
        assert_eq!(restored.len(), 4);
        let results = restored.search(&[0.0, 0.0, 1.0], 1).unwrap();
        assert_eq!(results[0].chunk.document_id, "d");
    }
}
