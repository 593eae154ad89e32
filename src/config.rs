//! Configuration for checklistgen

use crate::ingest::{DefaultExtractor, TextChunker};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "checklistgen.toml";
const DATABASE_FILE: &str = "checklistgen.db";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmSettings,

    #[serde(default)]
    pub embedding: EmbeddingSettings,

    #[serde(default)]
    pub chunking: ChunkingSettings,

    #[serde(default)]
    pub pipeline: PipelineSettings,

    #[serde(default)]
    pub fetch: FetchSettings,

    #[serde(default)]
    pub storage: StorageSettings,
}

/// Completion backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmSettings {
    /// API endpoint URL; Ollama when it listens on port 11434
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API key (if required)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Maximum tokens for response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Embedding backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,
}

/// Segment sizes, in characters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingSettings {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

/// Pipeline tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Concurrent summarization and metadata calls
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default = "default_cluster_seed")]
    pub cluster_seed: u64,

    #[serde(default = "default_flat_ceiling")]
    pub flat_ceiling: usize,

    #[serde(default = "default_combined_ceiling")]
    pub combined_ceiling: usize,

    #[serde(default = "default_min_detailed_tasks")]
    pub min_detailed_tasks: usize,

    /// Trim over-limit checklists after parsing
    #[serde(default = "default_enforce_ceiling")]
    pub enforce_ceiling: bool,
}

/// Web page retrieval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchSettings {
    /// Retries after HTTP 429
    #[serde(default = "default_fetch_retries")]
    pub max_retries: usize,

    /// First retry delay in milliseconds, doubled on each retry
    #[serde(default = "default_fetch_backoff_ms")]
    pub backoff_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

fn default_llm_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_llm_model() -> String {
    "llama3".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_embedding_dimension() -> usize {
    768
}

fn default_max_tokens() -> usize {
    4096
}

fn default_temperature() -> f32 {
    0.5
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_chunk_size() -> usize {
    10_000
}

fn default_chunk_overlap() -> usize {
    3_000
}

fn default_max_concurrency() -> usize {
    4
}

fn default_cluster_seed() -> u64 {
    crate::cluster::DEFAULT_SEED
}

fn default_flat_ceiling() -> usize {
    10
}

fn default_combined_ceiling() -> usize {
    15
}

fn default_min_detailed_tasks() -> usize {
    15
}

fn default_enforce_ceiling() -> bool {
    true
}

fn default_fetch_retries() -> usize {
    3
}

fn default_fetch_backoff_ms() -> u64 {
    500
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(crate::APP_NAME))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATABASE_FILE)
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            endpoint: default_llm_endpoint(),
            model: default_embedding_model(),
            api_key: None,
            dimension: default_embedding_dimension(),
        }
    }
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            cluster_seed: default_cluster_seed(),
            flat_ceiling: default_flat_ceiling(),
            combined_ceiling: default_combined_ceiling(),
            min_detailed_tasks: default_min_detailed_tasks(),
            enforce_ceiling: default_enforce_ceiling(),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            max_retries: default_fetch_retries(),
            backoff_ms: default_fetch_backoff_ms(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

impl Config {
    /// Default location of the configuration file
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|dir| dir.join(crate::APP_NAME))
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_FILE)
    }

    /// Load configuration from `path`, or defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            tracing::debug!("No config at {:?}, using defaults", path);
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            bail!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap,
                self.chunking.chunk_size
            );
        }
        if self.pipeline.max_concurrency == 0 {
            bail!("pipeline.max_concurrency must be at least 1");
        }
        if self.pipeline.flat_ceiling == 0 || self.pipeline.combined_ceiling == 0 {
            bail!("pipeline ceilings must be at least 1");
        }
        Ok(())
    }

    /// Completion client settings
    pub fn llm_config(&self) -> crate::llm::LlmConfig {
        crate::llm::LlmConfig {
            endpoint: self.llm.endpoint.trim_end_matches('/').to_string(),
            model: self.llm.model.clone(),
            api_key: self.llm.api_key.clone(),
            max_tokens: self.llm.max_tokens,
            temperature: self.llm.temperature,
            timeout: self.timeout(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs.max(1))
    }

    pub fn chunker(&self) -> crate::error::Result<TextChunker> {
        TextChunker::new(self.chunking.chunk_size, self.chunking.chunk_overlap)
    }

    /// Text extractor honoring the request timeout and the fetch retry policy
    pub fn extractor(&self) -> crate::error::Result<DefaultExtractor> {
        Ok(DefaultExtractor::new(self.timeout())?.with_retry_policy(
            self.fetch.max_retries,
            Duration::from_millis(self.fetch.backoff_ms),
        ))
    }

    /// Use `key` for both backends unless each already has one
    pub fn apply_api_key(&mut self, key: Option<String>) {
        let Some(key) = key.filter(|k| !k.trim().is_empty()) else {
            return;
        };
        self.llm.api_key.get_or_insert_with(|| key.clone());
        self.embedding.api_key.get_or_insert(key);
    }
}
