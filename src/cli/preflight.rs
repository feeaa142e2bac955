//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting
//! operations that would otherwise fail midway through an index build.

use crate::config::{EmbeddingProvider, Settings};
use crate::error::{GroundedError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Indexing needs an API key only for remote embeddings.
    Index,
    /// Asking needs an API key for generation.
    Ask,
    /// Search needs an API key only for remote embeddings.
    Search,
}

/// Whether `operation` talks to the remote backend under `settings`.
pub fn needs_api_key(operation: Operation, settings: &Settings) -> bool {
    let remote_embeddings = settings.embedding.provider == EmbeddingProvider::OpenAI;
    match operation {
        Operation::Ask => true,
        Operation::Index | Operation::Search => remote_embeddings,
    }
}

/// Run pre-flight checks for the given operation.
///
/// Returns the API key when the operation needs one, or an error describing
/// what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<Option<String>> {
    settings.validate()?;

    if !needs_api_key(operation, settings) {
        return Ok(None);
    }
    resolve_api_key(&settings.generation.api_key_env).map(Some)
}

/// Read the API key from the environment variable `var`.
pub fn resolve_api_key(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        Ok(_) => Err(GroundedError::Config(format!(
            "{} is empty. Set it with: export {}='sk-...'",
            var, var
        ))),
        Err(_) => Err(GroundedError::Config(format!(
            "{} not set. Set it with: export {}='sk-...'",
            var, var
        ))),
    }
}
