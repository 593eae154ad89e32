//! Segment summaries and the checklist prompt built from them

use super::run_bounded;
use crate::error::{ChecklistError, Result};
use crate::ingest::Segment;
use crate::llm::prompts::{SummaryPrompt, SynthesisPrompt};
use crate::llm::Completion;
use std::sync::Arc;

/// Summarizes representative segments concurrently
pub struct Summarizer {
    client: Arc<dyn Completion>,
    max_concurrency: usize,
}

impl Summarizer {
    pub fn new(client: Arc<dyn Completion>, max_concurrency: usize) -> Self {
        Self {
            client,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// One summary per segment, in segment order
    ///
    /// The first failed call fails the whole batch.
    pub async fn summarize(&self, segments: &[Segment]) -> Result<Vec<String>> {
        let prompts: Vec<String> = segments
            .iter()
            .map(|segment| SummaryPrompt::generate(&segment.text))
            .collect();

        tracing::info!(
            "Summarizing {} segments ({} at a time)",
            prompts.len(),
            self.max_concurrency
        );

        let client = Arc::clone(&self.client);
        run_bounded(prompts, self.max_concurrency, move |prompt| {
            let client = Arc::clone(&client);
            async move {
                let response = client.complete(&prompt, "").await?;
                Ok(response.content.trim().to_string())
            }
        })
        .await
    }
}

/// Merges summaries into one checklist-generation prompt
pub struct PromptSynthesizer {
    client: Arc<dyn Completion>,
}

impl PromptSynthesizer {
    pub fn new(client: Arc<dyn Completion>) -> Self {
        Self { client }
    }

    pub async fn synthesize(&self, summaries: &[String]) -> Result<String> {
        let summaries: Vec<String> = summaries
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if summaries.is_empty() {
            return Err(ChecklistError::Generation(
                "no summaries to build a prompt from".to_string(),
            ));
        }

        let response = self
            .client
            .complete(&SynthesisPrompt::generate(&summaries), "")
            .await?;
        let prompt = response.content.trim().to_string();

        if prompt.is_empty() {
            return Err(ChecklistError::Generation(
                "model returned an empty checklist prompt".to_string(),
            ));
        }

        tracing::debug!("Synthesized checklist prompt: {}", prompt);
        Ok(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{MockCompletion, MockFailure};

    fn segments() -> Vec<Segment> {
        vec![
            Segment::new(0, "alpha section"),
            Segment::new(4, "beta section"),
            Segment::new(9, "gamma section"),
        ]
    }

    #[tokio::test]
    async fn test_summaries_in_segment_order() {
        let client = Arc::new(
            MockCompletion::new()
                .with_response("alpha", "Summary A")
                .with_response("beta", "Summary B")
                .with_response("gamma", "Summary C"),
        );
        let summarizer = Summarizer::new(client.clone(), 2);

        let summaries = summarizer.summarize(&segments()).await.unwrap();
        assert_eq!(summaries, vec!["Summary A", "Summary B", "Summary C"]);
        assert_eq!(client.prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_one_failure_fails_batch() {
        let client = Arc::new(
            MockCompletion::new()
                .with_default("ok")
                .with_failure("beta", MockFailure::Backend("boom".into())),
        );
        let summarizer = Summarizer::new(client, 1);

        let err = summarizer.summarize(&segments()).await.unwrap_err();
        assert!(matches!(err, ChecklistError::Generation(_)));
    }

    #[tokio::test]
    async fn test_synthesis_joins_summaries() {
        let client = Arc::new(MockCompletion::new().with_default("  Create a safety checklist  "));
        let synthesizer = PromptSynthesizer::new(client.clone());

        let prompt = synthesizer
            .synthesize(&["one".to_string(), " ".to_string(), "two".to_string()])
            .await
            .unwrap();
        assert_eq!(prompt, "Create a safety checklist");
        assert!(client.prompts()[0].contains("```one\ntwo```"));
    }

    #[tokio::test]
    async fn test_synthesis_requires_summaries() {
        let synthesizer = PromptSynthesizer::new(Arc::new(MockCompletion::new()));
        assert!(synthesizer.synthesize(&[]).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_synthesis_is_an_error() {
        let synthesizer = PromptSynthesizer::new(Arc::new(MockCompletion::new().with_default("  ")));
        assert!(synthesizer.synthesize(&["x".to_string()]).await.is_err());
    }
}
