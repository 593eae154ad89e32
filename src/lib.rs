//! checklistgen - Bounded, hierarchical checklists from prompts and documents
//!
//! This library turns a short prompt, free text, or a long document into a
//! prioritized checklist tree using an LLM backend. Long inputs are embedded,
//! clustered and summarized first; embeddings are cached by content
//! fingerprint.

pub mod checklist;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod llm;
pub mod pipeline;
pub mod storage;

/// Re-export commonly used types
pub use checklist::{ChecklistNode, ChecklistTreeBuilder, StatusIndicatorSet};
pub use config::Config;
pub use error::{ChecklistError, Result};
pub use pipeline::{ChecklistOutcome, DocumentPipeline, GenerationMode};
pub use storage::Database;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "checklistgen";
