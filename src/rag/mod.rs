//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! Retrieval, prompt assembly and answer records. The [`pipeline`](crate::pipeline)
//! module wires these together with generation.

pub mod context;
mod prompt;
mod response;

pub use context::Retriever;
pub use prompt::{AssembledPrompt, PromptAssembler};
pub use response::{Answer, AnswerError};
