//! Status indicator generation

use crate::checklist::StatusIndicatorSet;
use crate::error::{ChecklistError, Result};
use crate::llm::prompts::{StatusIndicatorPrompt, STATUS_INDICATOR_SCHEMA};
use crate::llm::{complete_json, Completion};
use std::sync::Arc;

/// Derives the status label vocabulary for a checklist
pub struct StatusIndicatorGenerator {
    client: Arc<dyn Completion>,
}

impl StatusIndicatorGenerator {
    pub fn new(client: Arc<dyn Completion>) -> Self {
        Self { client }
    }

    /// Labels for a checklist, from its title and top-level task titles
    ///
    /// `Ok(None)` when the model's answer holds no usable set.
    pub async fn generate(
        &self,
        title: &str,
        task_titles: &[String],
    ) -> Result<Option<StatusIndicatorSet>> {
        if title.trim().is_empty() {
            return Err(ChecklistError::InputValidation(
                "checklist title is required".to_string(),
            ));
        }

        let prompt = StatusIndicatorPrompt::generate(title.trim(), task_titles);
        let Some(value) =
            complete_json(self.client.as_ref(), &prompt, STATUS_INDICATOR_SCHEMA).await?
        else {
            return Ok(None);
        };

        let set = StatusIndicatorSet::from_value(&value);
        if let Some(set) = &set {
            tracing::debug!("Status indicators for '{}': {:?}", title, set.labels());
        }
        Ok(set)
    }
}
