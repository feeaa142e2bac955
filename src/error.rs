//! Error types for Grounded.

use std::path::PathBuf;
use thiserror::Error;

/// Library-level error type for Grounded operations.
#[derive(Error, Debug)]
pub enum GroundedError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read document {}: {reason}", path.display())]
    DocumentRead { path: PathBuf, reason: String },

    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Index build failed: {0}")]
    IndexBuild(String),

    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Generation backend error: {0}")]
    GenerationBackend(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Coarse classification of a [`GroundedError`], for callers that branch on
/// the failure instead of parsing its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    DocumentRead,
    ModelUnavailable,
    IndexBuild,
    Retrieval,
    GenerationBackend,
    InvalidInput,
    Io,
    Serialization,
    Http,
}

impl GroundedError {
    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GroundedError::Config(_) => ErrorKind::Config,
            GroundedError::DocumentRead { .. } => ErrorKind::DocumentRead,
            GroundedError::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            GroundedError::IndexBuild(_) => ErrorKind::IndexBuild,
            GroundedError::Retrieval(_) => ErrorKind::Retrieval,
            GroundedError::GenerationBackend(_) => ErrorKind::GenerationBackend,
            GroundedError::InvalidInput(_) => ErrorKind::InvalidInput,
            GroundedError::Io(_) => ErrorKind::Io,
            GroundedError::Json(_)
            | GroundedError::TomlParse(_)
            | GroundedError::TomlSerialize(_) => ErrorKind::Serialization,
            GroundedError::Http(_) => ErrorKind::Http,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Config => "config",
            ErrorKind::DocumentRead => "document_read",
            ErrorKind::ModelUnavailable => "model_unavailable",
            ErrorKind::IndexBuild => "index_build",
            ErrorKind::Retrieval => "retrieval",
            ErrorKind::GenerationBackend => "generation_backend",
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Io => "io",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Http => "http",
        };
        write!(f, "{}", name)
    }
}

/// Result type alias for Grounded operations.
pub type Result<T> = std::result::Result<T, GroundedError>;
