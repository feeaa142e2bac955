//! Answer records returned to callers.

use crate::error::{ErrorKind, GroundedError};
use crate::generation::ERROR_MARKER;
use crate::index::SearchResult;
use uuid::Uuid;

/// Why a question could not be answered.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&GroundedError> for AnswerError {
    fn from(err: &GroundedError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// A generated answer with the chunks it was grounded on.
#[derive(Debug, Clone)]
pub struct Answer {
    /// Identifier for correlating logs with this answer.
    pub id: Uuid,
    pub question: String,
    /// The generated answer, or an `[error]`-prefixed message.
    pub text: String,
    /// Chunks included in the prompt, best first.
    pub sources: Vec<SearchResult>,
    pub error: Option<AnswerError>,
}

impl Answer {
    /// A successful answer.
    pub fn new(question: &str, text: String, sources: Vec<SearchResult>) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.to_string(),
            text,
            sources,
            error: None,
        }
    }

    /// An answer describing a failed query step.
    pub fn failed(question: &str, err: GroundedError, sources: Vec<SearchResult>) -> Self {
        Self {
            id: Uuid::new_v4(),
            question: question.to_string(),
            text: format!("{} {}", ERROR_MARKER, err),
            sources,
            error: Some(AnswerError::from(&err)),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Format the answer for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.text.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            for source in &self.sources {
                output.push_str(&format!(
                    "\n{} #{} (score: {:.2})",
                    source.chunk.document_id, source.chunk.ordinal, source.score
                ));
            }
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::Chunk;

    #[test]
    fn test_failed_answer_has_marker_and_kind() {
        let answer = Answer::failed(
            "q",
            GroundedError::GenerationBackend("connection refused".to_string()),
            Vec::new(),
        );

        assert!(answer.is_error());
        assert!(answer.text.starts_with("[error]"));
        assert_eq!(answer.error.as_ref().unwrap().kind, ErrorKind::GenerationBackend);
    }

    #[test]
    fn test_format_for_display_lists_sources() {
        let source = SearchResult {
            chunk: Chunk {
                document_id: "guide.md".to_string(),
                ordinal: 4,
                start: 0,
                end: 3,
                overlap: 0,
                text: "abc".to_string(),
            },
            score: 0.5,
        };
        let answer = Answer::new("q", "It is in Velmora.".to_string(), vec![source]);

        let display = answer.format_for_display();
        assert!(display.starts_with("It is in Velmora."));
        assert!(display.contains("guide.md #4 (score: 0.50)"));
    }
}
