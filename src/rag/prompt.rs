//! Prompt assembly under a size budget.

use crate::config::{GroundingMode, Prompts};
use crate::error::{GroundedError, Result};
use crate::index::SearchResult;
use std::collections::HashMap;
use tracing::debug;

/// A rendered prompt and how much of the retrieval result it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub text: String,
    /// Number of leading results included, in rank order.
    pub included: usize,
    /// Whether any retrieved text was dropped or cut to fit.
    pub truncated: bool,
}

/// Merges retrieved chunks and the question into the answer template.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    prompts: Prompts,
    mode: GroundingMode,
    delimiter: String,
    max_chars: usize,
}

impl PromptAssembler {
    pub fn new(prompts: Prompts, mode: GroundingMode) -> Self {
        Self {
            prompts,
            mode,
            delimiter: "\n\n---\n\n".to_string(),
            max_chars: 12_000,
        }
    }

    /// Set the delimiter placed between chunks.
    pub fn with_delimiter(mut self, delimiter: &str) -> Self {
        self.delimiter = delimiter.to_string();
        self
    }

    /// Set the maximum prompt length in characters.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        self.max_chars = max_chars;
        self
    }

    pub fn with_mode(mut self, mode: GroundingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> GroundingMode {
        self.mode
    }

    /// Text returned when retrieval finds nothing.
    pub fn no_context_answer(&self) -> &str {
        &self.prompts.rag.no_context
    }

    fn render(&self, question: &str, context: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), context.to_string());
        self.prompts
            .render_with_custom(self.prompts.rag.template(self.mode), &vars)
    }

    fn join(&self, results: &[SearchResult]) -> String {
        results
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join(&self.delimiter)
    }

    /// Build the prompt for `question` from `results`, which must be best first.
    ///
    /// Lowest-ranked chunks are dropped first when the prompt is too long; if
    /// the best chunk alone still does not fit, its text is cut short.
    pub fn assemble(&self, question: &str, results: &[SearchResult]) -> Result<AssembledPrompt> {
        let mut included = results.len();

        loop {
            let text = self.render(question, &self.join(&results[..included]));
            if text.chars().count() <= self.max_chars {
                if included < results.len() {
                    debug!("Dropped {} chunks to fit prompt budget", results.len() - included);
                }
                return Ok(AssembledPrompt {
                    text,
                    included,
                    truncated: included < results.len(),
                });
            }
            if included <= 1 {
                break;
            }
            included -= 1;
        }

        let base_len = self.render(question, "").chars().count();
        if base_len > self.max_chars || results.is_empty() {
            return Err(GroundedError::InvalidInput(format!(
                "question does not fit the prompt budget ({} > {} chars)",
                base_len, self.max_chars
            )));
        }

        let available = self.max_chars - base_len;
        let cut: String = results[0].chunk.text.chars().take(available).collect();
        let text = self.render(question, &cut);
        if text.chars().count() > self.max_chars {
            return Err(GroundedError::InvalidInput(format!(
                "prompt template cannot fit within {} chars",
                self.max_chars
            )));
        }

        debug!("Cut top chunk to {} chars to fit prompt budget", available);
        Ok(AssembledPrompt {
            text,
            included: 1,
            truncated: true,
        })
    }
}
