//! Grounded - question answering over a private document corpus.
//!
//! A local-first CLI tool and library that answers questions from your own
//! documents with retrieval-augmented generation, keeping answers grounded in
//! the retrieved text.
//!
//! # Overview
//!
//! Grounded allows you to:
//! - Index a directory of text and markdown files
//! - Search the corpus semantically
//! - Ask questions and get answers with the chunks they were drawn from
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompt templates
//! - `corpus` - Corpus loading
//! - `chunking` - Content chunking strategies
//! - `embedding` - Embedding generation
//! - `index` - Vector index and snapshots
//! - `rag` - Retrieval, prompt assembly and answers
//! - `generation` - Completion backends
//! - `pipeline` - Build and query orchestration
//!
//! # Example
//!
//! ```rust,no_run
//! use grounded::config::Settings;
//! use grounded::embedding::create_embedder;
//! use grounded::generation::OpenAIBackend;
//! use grounded::pipeline::PipelineBuilder;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let api_key = std::env::var(&settings.generation.api_key_env)?;
//!
//!     let embedder = create_embedder(&settings.embedding, Some(&api_key))?;
//!     let backend = Arc::new(OpenAIBackend::new(
//!         &settings.generation.base_url,
//!         &api_key,
//!         Duration::from_secs(settings.generation.timeout_secs),
//!     )?);
//!
//!     let mut builder = PipelineBuilder::from_settings(&settings, embedder, backend)?;
//!     let pipeline = builder.build(&settings.corpus_path()).await?;
//!
//!     let answer = pipeline.ask("What does the handbook say about leave?").await;
//!     println!("{}", answer.format_for_display());
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod index;
pub mod openai;
pub mod pipeline;
pub mod rag;

pub use error::{GroundedError, Result};
