//! Checklist generation under a ceiling policy

use crate::checklist::CeilingMode;
use crate::config::PipelineSettings;
use crate::error::Result;
use crate::llm::prompts::{
    ChecklistPrompt, DirectTextPrompt, CHECKLIST_SCHEMA, DIRECT_CHECKLIST_SCHEMA,
    FLAT_CHECKLIST_SCHEMA,
};
use crate::llm::Completion;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which ceiling policy a checklist is generated under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Minimum task target, nested subtasks, no maximum
    #[default]
    Detailed,
    /// Capped number of top-level tasks, no subtasks
    Flat,
    /// Capped number of tasks and subtasks together
    Combined,
}

impl std::fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationMode::Detailed => write!(f, "detailed"),
            GenerationMode::Flat => write!(f, "flat"),
            GenerationMode::Combined => write!(f, "combined"),
        }
    }
}

/// Asks the model for a checklist; returns the raw response text
pub struct ChecklistGenerator {
    client: Arc<dyn Completion>,
    settings: PipelineSettings,
}

impl ChecklistGenerator {
    pub fn new(client: Arc<dyn Completion>, settings: PipelineSettings) -> Self {
        Self { client, settings }
    }

    /// The ceiling that goes with a mode
    pub fn ceiling(&self, mode: GenerationMode) -> CeilingMode {
        match mode {
            GenerationMode::Detailed => CeilingMode::Detailed {
                min_tasks: self.settings.min_detailed_tasks,
            },
            GenerationMode::Flat => CeilingMode::Flat {
                max_tasks: self.settings.flat_ceiling,
            },
            GenerationMode::Combined => CeilingMode::Combined {
                max_total: self.settings.combined_ceiling,
            },
        }
    }

    /// Generate from a checklist prompt
    ///
    /// Context-limit rejections surface as `ContentTooLarge`; any other
    /// backend failure as `Generation`.
    pub async fn generate(&self, prompt: &str, mode: GenerationMode) -> Result<String> {
        let (text, schema) = match self.ceiling(mode) {
            CeilingMode::Detailed { min_tasks } => {
                (ChecklistPrompt::detailed(prompt, min_tasks), CHECKLIST_SCHEMA)
            }
            CeilingMode::Flat { max_tasks } => {
                (ChecklistPrompt::flat(prompt, max_tasks), FLAT_CHECKLIST_SCHEMA)
            }
            CeilingMode::Combined { max_total } => {
                (ChecklistPrompt::combined(prompt, max_total), CHECKLIST_SCHEMA)
            }
        };

        tracing::info!("Generating {} checklist", mode);
        let response = self.client.complete(&text, schema).await?;
        Ok(response.content)
    }

    /// Generate straight from document text, under the combined ceiling
    pub async fn generate_direct(&self, text: &str, extra_prompt: Option<&str>) -> Result<String> {
        let prompt =
            DirectTextPrompt::generate(text, extra_prompt, self.settings.combined_ceiling);

        tracing::info!("Generating checklist directly from {} chars of text", text.len());
        let response = self.client.complete(&prompt, DIRECT_CHECKLIST_SCHEMA).await?;
        Ok(response.content)
    }
}
