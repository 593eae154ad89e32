//! LLM access for the checklist pipeline
//!
//! This module handles:
//! - The text-in, text-out completion capability and its HTTP client
//! - Prompt templates and output schema hints
//! - Tolerant extraction of JSON from model output

mod client;
pub mod parser;
pub mod prompts;

pub use client::{
    is_context_limit_message, with_schema_hint, Completion, LlmClient, LlmConfig, LlmResponse,
    MockCompletion, MockFailure,
};
pub use parser::parse_response;

use crate::error::Result;
use serde_json::Value;

/// Run one completion and extract its JSON payload
///
/// Transport failures are errors; output without decodable JSON is `Ok(None)`.
pub async fn complete_json(
    client: &dyn Completion,
    prompt: &str,
    schema_hint: &str,
) -> Result<Option<Value>> {
    let response = client.complete(prompt, schema_hint).await?;

    if let Some(tokens) = response.tokens_used {
        tracing::debug!("Completion used {} tokens", tokens);
    }

    Ok(parse_response(&response.content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_complete_json() {
        let client = MockCompletion::new()
            .with_response("fenced", "Sure!\n```json\n{\"ok\": true}\n```")
            .with_default("I cannot help with that.");

        let value = complete_json(&client, "fenced please", "").await.unwrap();
        assert_eq!(value, Some(serde_json::json!({"ok": true})));

        let none = complete_json(&client, "anything else", "").await.unwrap();
        assert_eq!(none, None);
    }

    #[tokio::test]
    async fn test_complete_json_propagates_failures() {
        let client = MockCompletion::new().with_failure("big", MockFailure::ContextLimit);
        let err = complete_json(&client, "big input", "").await.unwrap_err();
        assert!(matches!(err, crate::error::ChecklistError::ContentTooLarge(_)));
    }
}
