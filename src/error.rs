//! Error taxonomy shared by every pipeline stage
//!
//! Hard failures are variants of [`ChecklistError`]. Soft failures (an LLM
//! answer with no decodable JSON, a cache entry whose segments and vectors
//! disagree) never show up here: they surface as `None` plus a warning.

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, ChecklistError>;

/// Errors that abort a checklist run
#[derive(Debug, Error)]
pub enum ChecklistError {
    /// Missing, empty or out-of-bounds input
    #[error("invalid input: {0}")]
    InputValidation(String),

    /// Source kind not recognized, or a corrupt/encrypted document
    #[error("unsupported content: {0}")]
    UnsupportedContent(String),

    /// The completion backend rejected the prompt for exceeding its context size
    #[error("content too large for the language model: {0}")]
    ContentTooLarge(String),

    /// Any other completion or embedding backend failure
    #[error("generation failed: {0}")]
    Generation(String),

    /// SQLite failure
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Transport failure talking to an external document source
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local I/O failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure of our own records
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChecklistError {
    /// Single human-readable message for the abort path
    pub fn user_message(&self) -> &'static str {
        match self {
            ChecklistError::InputValidation(_) => "Bad input: check the required fields and their size limits.",
            ChecklistError::UnsupportedContent(_) => {
                "Bad input: the document type is not supported or the file is corrupted."
            }
            ChecklistError::ContentTooLarge(_) => {
                "Content too large to process: reduce the input size and try again."
            }
            ChecklistError::Generation(_) | ChecklistError::Http(_) => {
                "Checklist generation failed, please try again."
            }
            ChecklistError::Storage(_) | ChecklistError::Io(_) | ChecklistError::Json(_) => {
                "Internal error while saving the checklist, please try again."
            }
        }
    }

    /// Whether the caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChecklistError::Generation(_) | ChecklistError::Http(_))
    }
}
