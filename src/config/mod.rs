//! Configuration module for Grounded.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    ChunkingSettings, CorpusSettings, EmbeddingProvider, EmbeddingSettings, GeneralSettings,
    GenerationSettings, GroundingMode, IndexSettings, PromptSettings, RetrievalSettings, Settings,
};
