//! Refining a short checklist brief into a generation prompt

use crate::error::{ChecklistError, Result};
use crate::llm::prompts::RefinePrompt;
use crate::llm::Completion;
use serde::Serialize;
use std::sync::Arc;

/// What a checklist is for and who will use it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChecklistBrief {
    pub name: String,
    /// Team or project the checklist serves
    pub team: String,
    pub organization: Option<String>,
    pub role: Option<String>,
}

impl ChecklistBrief {
    pub fn new(name: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            team: team.into(),
            ..Default::default()
        }
    }

    pub fn with_organization(mut self, organization: Option<String>) -> Self {
        self.organization = organization;
        self
    }

    pub fn with_role(mut self, role: Option<String>) -> Self {
        self.role = role;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.team.trim().is_empty() {
            return Err(ChecklistError::InputValidation(
                "checklist name and team are required".to_string(),
            ));
        }
        Ok(())
    }
}

pub struct PromptRefiner {
    client: Arc<dyn Completion>,
}

impl PromptRefiner {
    pub fn new(client: Arc<dyn Completion>) -> Self {
        Self { client }
    }

    /// One refined, plain-text prompt for the brief
    pub async fn refine(&self, brief: &ChecklistBrief) -> Result<String> {
        brief.validate()?;

        let prompt = RefinePrompt::generate(
            &brief.name,
            &brief.team,
            brief.organization.as_deref(),
            brief.role.as_deref(),
        );
        let response = self.client.complete(&prompt, "").await?;
        let refined = clean_answer(&response.content);

        if refined.is_empty() {
            return Err(ChecklistError::Generation(
                "model returned an empty refined prompt".to_string(),
            ));
        }

        tracing::info!("Refined prompt for '{}': {}", brief.name.trim(), refined);
        Ok(refined)
    }
}

/// Drop an answer label and wrapping quotes or backticks
fn clean_answer(raw: &str) -> String {
    let mut answer = raw.trim();
    for label in ["Final Answer:", "Prompt:"] {
        if let Some(rest) = answer
            .get(..label.len())
            .filter(|head| head.eq_ignore_ascii_case(label))
            .map(|_| &answer[label.len()..])
        {
            answer = rest.trim_start();
        }
    }
    answer
        .trim_matches(|c: char| c == '"' || c == '`')
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockCompletion, MockFailure};

    #[tokio::test]
    async fn test_refine_uses_every_brief_field() {
        let client = Arc::new(MockCompletion::new().with_response(
            "checklist brief",
            "Final Answer: \"Create an on-page SEO checklist for a software team\"",
        ));
        let refiner = PromptRefiner::new(client.clone());
        let brief = ChecklistBrief::new("On-page SEO", "SEO")
            .with_organization(Some("Acme".to_string()))
            .with_role(Some("Content lead".to_string()));

        let refined = refiner.refine(&brief).await.unwrap();
        assert_eq!(refined, "Create an on-page SEO checklist for a software team");

        let sent = &client.prompts()[0];
        assert!(sent.contains("Checklist name: \"On-page SEO\""));
        assert!(sent.contains("Team or project: \"SEO\""));
        assert!(sent.contains("Organization: \"Acme\""));
        assert!(sent.contains("Role: \"Content lead\""));
    }

    #[tokio::test]
    async fn test_blank_brief_rejected_before_calling_model() {
        let client = Arc::new(MockCompletion::new());
        let refiner = PromptRefiner::new(client.clone());

        let err = refiner
            .refine(&ChecklistBrief::new("Audit", "  "))
            .await
            .unwrap_err();
        assert!(matches!(err, ChecklistError::InputValidation(_)));
        assert!(client.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_empty_answer_is_generation_failure() {
        let refiner =
            PromptRefiner::new(Arc::new(MockCompletion::new().with_default("``  ``")));
        let err = refiner
            .refine(&ChecklistBrief::new("Audit", "Finance"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChecklistError::Generation(_)));
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let client = MockCompletion::new()
            .with_failure("checklist brief", MockFailure::Backend("503".to_string()));
        let err = PromptRefiner::new(Arc::new(client))
            .refine(&ChecklistBrief::new("Audit", "Finance"))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_clean_answer() {
        assert_eq!(clean_answer("  plain prompt \n"), "plain prompt");
        assert_eq!(clean_answer("prompt: `Check the gear`"), "Check the gear");
        assert_eq!(clean_answer("\"\""), "");
    }
}
