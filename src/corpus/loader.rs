//! Local directory loader.

use super::{Document, IngestReport};
use crate::error::{GroundedError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use walkdir::{DirEntry, WalkDir};

/// Loads plain-text documents from a directory tree.
pub struct CorpusLoader {
    extensions: Vec<String>,
}

impl CorpusLoader {
    /// Create a loader accepting the default `txt` and `md` extensions.
    pub fn new() -> Self {
        Self::with_extensions(&["txt".to_string(), "md".to_string()])
    }

    /// Create a loader for the given extensions. An empty list accepts every file.
    pub fn with_extensions(extensions: &[String]) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// Load every accepted file under `root`.
    ///
    /// Fails only when `root` itself is not a readable directory.
    #[instrument(skip(self), fields(root = %root.display()))]
    pub fn load(&self, root: &Path) -> Result<IngestReport> {
        if !root.is_dir() {
            return Err(GroundedError::InvalidInput(format!(
                "Corpus path is not a directory: {}",
                root.display()
            )));
        }

        let mut report = IngestReport::default();

        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                    warn!("Skipping unreadable entry {}: {}", path.display(), e);
                    report.failures.push(GroundedError::DocumentRead {
                        path,
                        reason: e.to_string(),
                    });
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.accepts(entry.path()) {
                continue;
            }

            match read_document(root, entry.path()) {
                Ok(doc) if doc.text.trim().is_empty() => {
                    debug!("Skipping empty document {}", doc.id);
                    report.skipped.push(entry.path().to_path_buf());
                }
                Ok(doc) => report.documents.push(doc),
                Err(e) => {
                    warn!("{}", e);
                    report.failures.push(e);
                }
            }
        }

        info!(
            "Loaded {} documents ({} failed, {} empty)",
            report.documents.len(),
            report.failures.len(),
            report.skipped.len()
        );

        Ok(report)
    }
}

impl Default for CorpusLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn read_document(root: &Path, path: &Path) -> Result<Document> {
    let bytes = std::fs::read(path).map_err(|e| GroundedError::DocumentRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let text = String::from_utf8(bytes).map_err(|e| GroundedError::DocumentRead {
        path: path.to_path_buf(),
        reason: format!("not valid UTF-8: {}", e.utf8_error()),
    })?;

    Ok(Document::new(document_id(root, path), text))
}

fn document_id(root: &Path, path: &Path) -> String {
    let relative: PathBuf = path.strip_prefix(root).unwrap_or(path).to_path_buf();
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
