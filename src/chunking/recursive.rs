//! Separator-aware recursive chunking.
//!
//! Tries paragraph breaks first, then sentence breaks, then whitespace, and only
//! falls back to raw character windows when `split_long_words` is set.

use super::{build_chunks, char_len, Chunk, Chunker, ChunkingConfig};
use crate::corpus::Document;
use regex::Regex;
use std::ops::Range;
use tracing::debug;

/// Separator levels, coarsest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Paragraph,
    Sentence,
    Word,
    Character,
}

const LEVELS: [Level; 4] = [Level::Paragraph, Level::Sentence, Level::Word, Level::Character];

/// Recursive separator chunker.
pub struct RecursiveChunker {
    config: ChunkingConfig,
    paragraph: Regex,
    sentence: Regex,
    word: Regex,
}

impl RecursiveChunker {
    pub fn new(config: ChunkingConfig) -> Self {
        Self {
            config,
            paragraph: Regex::new(r"\n[ \t]*\n\s*").expect("Invalid regex"),
            sentence: Regex::new(r#"[.!?]+["')\]]*\s+"#).expect("Invalid regex"),
            word: Regex::new(r"\s+").expect("Invalid regex"),
        }
    }

    /// Split `text` into contiguous pieces ending right after each separator.
    fn pieces(&self, text: &str, level: Level) -> Vec<Range<usize>> {
        let boundaries: Vec<usize> = match level {
            Level::Paragraph => self.paragraph.find_iter(text).map(|m| m.end()).collect(),
            Level::Sentence => self.sentence.find_iter(text).map(|m| m.end()).collect(),
            Level::Word => self.word.find_iter(text).map(|m| m.end()).collect(),
            Level::Character => text.char_indices().map(|(i, c)| i + c.len_utf8()).collect(),
        };

        let mut pieces = Vec::new();
        let mut start = 0;
        for end in boundaries {
            if end > start && end < text.len() {
                pieces.push(start..end);
                start = end;
            }
        }
        if start < text.len() {
            pieces.push(start..text.len());
        }
        pieces
    }

    /// Partition `text` (located at `base` in the document) into segments of at
    /// most `budget` characters, recursing to finer separators as needed.
    fn segment(&self, text: &str, base: usize, level: usize, out: &mut Vec<Range<usize>>) {
        let budget = self.config.budget();
        let whole = base..base + text.len();

        if char_len(text) <= budget {
            out.push(whole);
            return;
        }

        let sep = match LEVELS.get(level) {
            Some(Level::Character) if !self.config.split_long_words => None,
            Some(sep) => Some(*sep),
            None => None,
        };
        let Some(sep) = sep else {
            // Atomic unit larger than a chunk: keep it whole.
            debug!("Keeping oversized atomic unit of {} chars", char_len(text));
            out.push(whole);
            return;
        };

        let pieces = self.pieces(text, sep);
        if pieces.len() <= 1 {
            self.segment(text, base, level + 1, out);
            return;
        }

        let mut current: Option<Range<usize>> = None;
        let mut current_len = 0;

        for piece in pieces {
            let piece_len = char_len(&text[piece.clone()]);

            if piece_len > budget {
                if let Some(cur) = current.take() {
                    out.push(base + cur.start..base + cur.end);
                }
                self.segment(&text[piece.clone()], base + piece.start, level + 1, out);
                continue;
            }

            match current.as_mut() {
                Some(cur) if current_len + piece_len <= budget => {
                    cur.end = piece.end;
                    current_len += piece_len;
                }
                _ => {
                    if let Some(cur) = current.take() {
                        out.push(base + cur.start..base + cur.end);
                    }
                    current = Some(piece);
                    current_len = piece_len;
                }
            }
        }

        if let Some(cur) = current {
            out.push(base + cur.start..base + cur.end);
        }
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::new(ChunkingConfig::default())
    }
}

impl Chunker for RecursiveChunker {
    fn split(&self, document: &Document) -> Vec<Chunk> {
        if document.text.is_empty() {
            return Vec::new();
        }

        let mut segments = Vec::new();
        self.segment(&document.text, 0, 0, &mut segments);

        let chunks = build_chunks(document, &segments, self.config.overlap);
        debug!("Split {} into {} chunks", document.id, chunks.len());
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::test_support::{assert_overlap_invariants, reconstruct};

    fn chunker(max_size: usize, overlap: usize) -> RecursiveChunker {
        RecursiveChunker::new(ChunkingConfig::new(max_size, overlap).unwrap())
    }

    fn sample_text() -> String {
        let para = "Rust has a strong type system. Ownership rules prevent data races! \
                    Lifetimes are checked at compile time? Yes they are.";
        [para; 6].join("\n\n")
    }

    #[test]
    fn test_empty_document_yields_no_chunks() {
        let chunks = chunker(100, 10).split(&Document::new("empty", ""));
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_short_document_is_single_chunk() {
        let doc = Document::new("short", "Just one line.");
        let chunks = chunker(100, 10).split(&doc);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, doc.text);
        assert_eq!(chunks[0].overlap, 0);
        assert_eq!(chunks[0].ordinal, 0);
    }

    #[test]
    fn test_lossless_reconstruction() {
        let doc = Document::new("doc", sample_text());
        for (max_size, overlap) in [(60, 0), (80, 15), (150, 40), (400, 100)] {
            let chunks = chunker(max_size, overlap).split(&doc);
            assert!(chunks.len() > 1);
            assert_eq!(reconstruct(&chunks), doc.text, "max_size={max_size} overlap={overlap}");
        }
    }

    #[test]
    fn test_chunks_respect_max_size() {
        let doc = Document::new("doc", sample_text());
        let chunks = chunker(80, 20).split(&doc);
        for chunk in &chunks {
            assert!(chunk.char_len() <= 80, "chunk {} has {} chars", chunk.ordinal, chunk.char_len());
        }
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let doc = Document::new("doc", sample_text());
        let chunks = chunker(120, 30).split(&doc);
        assert_overlap_invariants(&chunks, 30);
        assert!(chunks.iter().skip(1).all(|c| c.overlap > 0));
    }

    #[test]
    fn test_prefers_paragraph_boundaries() {
        let doc = Document::new("doc", "First paragraph here.\n\nSecond paragraph here.");
        let chunks = chunker(30, 0).split(&doc);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "First paragraph here.\n\n");
        assert_eq!(chunks[1].text, "Second paragraph here.");
    }

    #[test]
    fn test_falls_back_to_sentences() {
        let doc = Document::new("doc", "One short sentence. Another short sentence. A third one.");
        let chunks = chunker(25, 0).split(&doc);
        assert_eq!(chunks[0].text, "One short sentence. ");
        assert_eq!(chunks[1].text, "Another short sentence. ");
        assert_eq!(chunks[2].text, "A third one.");
    }

    #[test]
    fn test_long_word_kept_whole() {
        let word = "x".repeat(50);
        let doc = Document::new("doc", format!("tiny {} end", word));
        let chunks = chunker(20, 0).split(&doc);

        assert_eq!(reconstruct(&chunks), doc.text);
        let oversized: Vec<_> = chunks.iter().filter(|c| c.char_len() > 20).collect();
        assert_eq!(oversized.len(), 1);
        assert!(oversized[0].text.contains(&word));
        assert!(!oversized[0].body().trim().contains(' '));
    }

    #[test]
    fn test_long_word_split_when_enabled() {
        let mut config = ChunkingConfig::new(20, 5).unwrap();
        config.split_long_words = true;
        let doc = Document::new("doc", "y".repeat(100));
        let chunks = RecursiveChunker::new(config).split(&doc);

        assert!(chunks.iter().all(|c| c.char_len() <= 20));
        assert_eq!(reconstruct(&chunks), doc.text);
        assert_overlap_invariants(&chunks, 5);
    }

    #[test]
    fn test_unicode_text() {
        let text = "Ærlig talt, blåbærsyltetøy er godt. Ünïcödé wörks fine here. 日本語のテキストも大丈夫です。 ".repeat(8);
        let doc = Document::new("doc", text);
        let chunks = chunker(50, 12).split(&doc);

        assert_eq!(reconstruct(&chunks), doc.text);
        assert_overlap_invariants(&chunks, 12);
    }

    #[test]
    fn test_offsets_match_text() {
        let doc = Document::new("doc", sample_text());
        for chunk in chunker(90, 25).split(&doc) {
            assert_eq!(&doc.text[chunk.start..chunk.end], chunk.text);
            assert_eq!(chunk.document_id, "doc");
        }
    }
}
