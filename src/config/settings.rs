//! Configuration settings for Grounded.

use crate::error::{GroundedError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub corpus: CorpusSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
    pub prompts: PromptSettings,
    pub index: IndexSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.grounded".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// Document corpus settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusSettings {
    /// Root directory of the document corpus.
    pub path: String,
    /// File extensions to ingest. Empty means every file.
    pub extensions: Vec<String>,
}

impl Default for CorpusSettings {
    fn default() -> Self {
        Self {
            path: "./corpus".to_string(),
            extensions: vec!["txt".to_string(), "md".to_string()],
        }
    }
}

/// Content chunking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    /// Chunking strategy (recursive, fixed).
    pub strategy: String,
    /// Maximum chunk size in characters.
    pub max_size: usize,
    /// Characters carried over from the previous chunk.
    pub overlap: usize,
    /// Hard-split single words longer than a chunk.
    pub split_long_words: bool,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            strategy: "recursive".to_string(),
            max_size: 1000,
            overlap: 200,
            split_long_words: false,
        }
    }
}

/// Embedding provider type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// In-process hashed n-gram embeddings (default, no network).
    #[default]
    Hashing,
    /// Any OpenAI-compatible embeddings endpoint.
    OpenAI,
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hashing" | "local" => Ok(EmbeddingProvider::Hashing),
            "openai" => Ok(EmbeddingProvider::OpenAI),
            _ => Err(format!("Unknown embedding provider: {}", s)),
        }
    }
}

impl std::fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProvider::Hashing => write!(f, "hashing"),
            EmbeddingProvider::OpenAI => write!(f, "openai"),
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding provider (hashing, openai).
    pub provider: EmbeddingProvider,
    /// Embedding model to use (openai provider only).
    pub model: String,
    /// Embedding dimensions.
    pub dimensions: u32,
    /// Base URL of the embeddings endpoint (openai provider only).
    pub base_url: String,
    /// Texts per embedding request.
    pub batch_size: usize,
    /// Maximum concurrent embedding requests during index build.
    pub concurrency: usize,
    /// Timeout for a single embedding call.
    pub timeout_secs: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hashing,
            model: "text-embedding-3-small".to_string(),
            dimensions: 384,
            base_url: "https://api.openai.com/v1".to_string(),
            batch_size: 64,
            concurrency: 4,
            timeout_secs: 60,
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of chunks handed to generation.
    pub top_k: usize,
    /// Minimum cosine similarity for a chunk to be retrieved.
    pub min_score: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            min_score: 0.0,
        }
    }
}

/// Generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Chat model used for answers.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum tokens in the generated answer.
    pub max_tokens: u32,
    /// Base URL of the chat completions endpoint.
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Timeout for a single completion call.
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_tokens: 512,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

/// How strictly the prompt binds the answer to the retrieved context.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GroundingMode {
    /// Answer only from context, treat it as authoritative.
    #[default]
    Strict,
    /// Use the context, but allow the model to fill gaps.
    Permissive,
}

impl std::str::FromStr for GroundingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(GroundingMode::Strict),
            "permissive" | "soft" => Ok(GroundingMode::Permissive),
            _ => Err(format!("Unknown grounding mode: {}", s)),
        }
    }
}

impl std::fmt::Display for GroundingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroundingMode::Strict => write!(f, "strict"),
            GroundingMode::Permissive => write!(f, "permissive"),
        }
    }
}

/// Prompt settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptSettings {
    /// Grounding strictness of the answer template.
    pub grounding: GroundingMode,
    /// Upper bound on the assembled prompt, in characters.
    pub max_prompt_chars: usize,
    /// Delimiter placed between context chunks.
    pub context_delimiter: String,
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            grounding: GroundingMode::Strict,
            max_prompt_chars: 12_000,
            context_delimiter: "\n\n---\n\n".to_string(),
            custom_dir: None,
            variables: HashMap::new(),
        }
    }
}

/// Index snapshot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Where `grounded index` writes the snapshot by default.
    pub snapshot_path: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            snapshot_path: "~/.grounded/index.json".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_size == 0 {
            return Err(GroundedError::Config(
                "chunking.max_size must be greater than zero".to_string(),
            ));
        }
        if self.chunking.overlap >= self.chunking.max_size {
            return Err(GroundedError::Config(format!(
                "chunking.overlap ({}) must be smaller than chunking.max_size ({})",
                self.chunking.overlap, self.chunking.max_size
            )));
        }
        if self.embedding.dimensions == 0 {
            return Err(GroundedError::Config(
                "embedding.dimensions must be greater than zero".to_string(),
            ));
        }
        if self.retrieval.top_k == 0 {
            return Err(GroundedError::Config(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(GroundedError::Config(format!(
                "generation.temperature must be within 0.0..=2.0, got {}",
                self.generation.temperature
            )));
        }
        for (key, value) in [
            ("generation.base_url", &self.generation.base_url),
            ("embedding.base_url", &self.embedding.base_url),
        ] {
            url::Url::parse(value)
                .map_err(|e| GroundedError::Config(format!("{} is not a valid URL: {}", key, e)))?;
        }
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("grounded")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded corpus directory path.
    pub fn corpus_path(&self) -> PathBuf {
        Self::expand_path(&self.corpus.path)
    }

    /// Get the expanded index snapshot path.
    pub fn snapshot_path(&self) -> PathBuf {
        Self::expand_path(&self.index.snapshot_path)
    }
}
