//! Document ingestion
//!
//! This module handles:
//! - Content fingerprints used as cache and dedup keys
//! - Splitting long text into overlapping segments
//! - Extracting plain text from the supported source kinds
//! - Word-count bounds on free-text inputs

pub mod chunker;
pub mod extract;

pub use chunker::TextChunker;
pub use extract::{DefaultExtractor, Source, SourceKind, TextExtractor};

use crate::error::{ChecklistError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Word bounds for a free-text checklist prompt
pub const PROMPT_WORD_BOUNDS: (usize, usize) = (3, 100);

/// Word bounds for free text turned into a checklist
pub const TEXT_WORD_BOUNDS: (usize, usize) = (100, 5000);

/// Stable content fingerprint (hex SHA-256)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fingerprint a byte slice
pub fn fingerprint_bytes(bytes: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    Fingerprint(hex::encode(hasher.finalize()))
}

/// Fingerprint text by its UTF-8 bytes
pub fn fingerprint_text(text: &str) -> Fingerprint {
    fingerprint_bytes(text.as_bytes())
}

/// Fingerprint a whole stream, restoring the read position afterwards
pub fn fingerprint_reader<R: Read + Seek>(reader: &mut R) -> Result<Fingerprint> {
    let position = reader.stream_position()?;
    reader.seek(SeekFrom::Start(0))?;

    let mut hasher = Sha256::new();
    let mut buf = [0u8; 4096];
    loop {
        let read = reader.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }

    reader.seek(SeekFrom::Start(position))?;
    Ok(Fingerprint(hex::encode(hasher.finalize())))
}

/// Read a whole file along with its fingerprint
pub fn read_fingerprinted(path: &Path) -> Result<(Fingerprint, Vec<u8>)> {
    let mut file = std::fs::File::open(path)?;
    let fingerprint = fingerprint_reader(&mut file)?;

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok((fingerprint, bytes))
}

/// A contiguous slice of the source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Position of the segment in the source
    pub index: usize,
    /// Segment text
    pub text: String,
}

impl Segment {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }
}

/// Count whitespace-separated words
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Check a checklist prompt against [`PROMPT_WORD_BOUNDS`]
pub fn validate_prompt_words(prompt: &str) -> Result<()> {
    validate_words("prompt", prompt, PROMPT_WORD_BOUNDS)
}

/// Check free text against [`TEXT_WORD_BOUNDS`]
pub fn validate_text_words(text: &str) -> Result<()> {
    validate_words("text", text, TEXT_WORD_BOUNDS)
}

fn validate_words(field: &str, value: &str, (min, max): (usize, usize)) -> Result<()> {
    let words = word_count(value);
    if words == 0 {
        return Err(ChecklistError::InputValidation(format!("{} is required", field)));
    }
    if words < min || words > max {
        return Err(ChecklistError::InputValidation(format!(
            "{} must be between {} and {} words, got {}",
            field, min, max, words
        )));
    }
    Ok(())
}
