//! Sample prompts for a role and industry

use crate::error::{ChecklistError, Result};
use crate::llm::prompts::{SamplePromptsPrompt, SAMPLE_PROMPTS_SCHEMA};
use crate::llm::{complete_json, Completion};
use serde_json::Value;
use std::sync::Arc;

/// Most prompts returned per request
pub const MAX_SAMPLE_PROMPTS: usize = 6;

pub struct SamplePromptGenerator {
    client: Arc<dyn Completion>,
}

impl SamplePromptGenerator {
    pub fn new(client: Arc<dyn Completion>) -> Self {
        Self { client }
    }

    /// Up to six distinct prompts; empty when the answer does not parse
    pub async fn generate(&self, job_role: &str, industry: &str) -> Result<Vec<String>> {
        let (job_role, industry) = (job_role.trim(), industry.trim());
        if job_role.is_empty() || industry.is_empty() {
            return Err(ChecklistError::InputValidation(
                "job role and industry are required".to_string(),
            ));
        }

        let prompt = SamplePromptsPrompt::generate(job_role, industry, MAX_SAMPLE_PROMPTS);
        let value = complete_json(self.client.as_ref(), &prompt, SAMPLE_PROMPTS_SCHEMA).await?;

        let items = match &value {
            Some(Value::Object(object)) => object.get("prompts").and_then(Value::as_array),
            Some(Value::Array(items)) => Some(items),
            _ => None,
        };

        let mut prompts: Vec<String> = Vec::new();
        for item in items.into_iter().flatten().filter_map(Value::as_str) {
            let item = item.trim();
            if !item.is_empty() && !prompts.iter().any(|p| p.eq_ignore_ascii_case(item)) {
                prompts.push(item.to_string());
            }
        }
        prompts.truncate(MAX_SAMPLE_PROMPTS);

        Ok(prompts)
    }
}
