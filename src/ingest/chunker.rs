//! Overlapping text segmentation
//!
//! Splits text into segments of at most `chunk_size` characters. Each
//! segment after the first starts `chunk_overlap` characters before the end
//! of the previous one, so consecutive segments share context and the
//! segments together cover the whole input. Cut points prefer paragraph,
//! line, sentence and word boundaries, in that order.

use super::Segment;
use crate::error::{ChecklistError, Result};

/// Boundaries tried, most preferred first
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Splits long text into bounded, overlapping segments
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Create a chunker; the overlap must be smaller than the chunk size
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ChecklistError::InputValidation(
                "chunk size must be positive".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(ChecklistError::InputValidation(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split text into ordered segments
    pub fn split(&self, text: &str) -> Vec<Segment> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut segments = Vec::new();
        let mut start = 0;

        loop {
            let hard_end = advance_chars(text, start, self.chunk_size);
            let end = if hard_end == text.len() {
                hard_end
            } else {
                self.find_break(text, start, hard_end)
            };

            segments.push(Segment::new(segments.len(), &text[start..end]));

            if end == text.len() {
                break;
            }

            let next = retreat_chars(text, end, self.chunk_overlap);
            start = if next > start {
                next
            } else {
                advance_chars(text, start, 1)
            };
        }

        tracing::debug!(
            "Split {} chars into {} segments (size {}, overlap {})",
            text.len(),
            segments.len(),
            self.chunk_size,
            self.chunk_overlap
        );

        segments
    }

    /// Pick a cut point in the second half of the window
    fn find_break(&self, text: &str, start: usize, hard_end: usize) -> usize {
        let min_break = advance_chars(text, start, self.chunk_size / 2);
        if min_break >= hard_end {
            return hard_end;
        }

        let window = &text[min_break..hard_end];
        for separator in SEPARATORS {
            if let Some(pos) = window.rfind(separator) {
                return min_break + pos + separator.len();
            }
        }

        hard_end
    }
}

/// Byte offset `n` characters after `from`, clamped to the end
fn advance_chars(text: &str, from: usize, n: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(n)
        .map(|(i, _)| from + i)
        .unwrap_or(text.len())
}

/// Byte offset `n` characters before `from`, clamped to the start
fn retreat_chars(text: &str, from: usize, n: usize) -> usize {
    if n == 0 {
        return from;
    }
    text[..from]
        .char_indices()
        .rev()
        .nth(n - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}
