//! CLI module for Grounded.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand, ValueEnum};
use crate::config::GroundingMode;

/// Grounded - question answering over your own documents
///
/// A local-first CLI tool that indexes a directory of documents and answers
/// questions using only what those documents say.
#[derive(Parser, Debug)]
#[command(name = "grounded")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where a query command gets its index from.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct IndexSource {
    /// Build the index from this corpus directory instead of loading a snapshot
    #[arg(long, conflicts_with = "index")]
    pub corpus: Option<String>,

    /// Index snapshot to load (defaults to index.snapshot_path)
    #[arg(long)]
    pub index: Option<String>,
}

/// Grounding mode selectable on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundingArg {
    Strict,
    Permissive,
}

impl From<GroundingArg> for GroundingMode {
    fn from(arg: GroundingArg) -> Self {
        match arg {
            GroundingArg::Strict => GroundingMode::Strict,
            GroundingArg::Permissive => GroundingMode::Permissive,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the index from a corpus directory and save a snapshot
    Index {
        /// Corpus directory (defaults to corpus.path)
        corpus: Option<String>,

        /// Snapshot output file (defaults to index.snapshot_path)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Ask a question and get an answer grounded in the corpus
    Ask {
        /// The question to ask
        question: String,

        /// Number of chunks to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// LLM model to use for response generation
        #[arg(short, long)]
        model: Option<String>,

        /// How strictly the answer must stick to the retrieved context
        #[arg(long, value_enum)]
        grounding: Option<GroundingArg>,

        #[command(flatten)]
        source: IndexSource,
    },

    /// Search the corpus for relevant chunks
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,

        /// Minimum similarity score (-1.0 to 1.0)
        #[arg(long)]
        min_score: Option<f32>,

        #[command(flatten)]
        source: IndexSource,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file if none exists
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
