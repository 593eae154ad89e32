//! Per-task metadata generation

use super::run_bounded;
use crate::error::{ChecklistError, Result};
use crate::llm::prompts::{TaskMetadataPrompt, TASK_METADATA_SCHEMA};
use crate::llm::{complete_json, Completion};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Metadata describing how to carry out one task
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskMetadata {
    pub task: String,
    pub description: Option<String>,
    pub references: Vec<String>,
    pub completion_criteria: Option<String>,
    pub complexity: Option<String>,
    pub priority: Option<String>,
    pub estimated_time_to_complete: Option<String>,
    pub frequency: Option<String>,
    pub instructions: Vec<String>,
}

impl TaskMetadata {
    /// Read the metadata object the model returned for `task`
    pub fn from_value(task: &str, value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = |key: &str| object.get(key).and_then(text_field);
        let list = |key: &str| object.get(key).map(list_field).unwrap_or_default();

        Some(Self {
            task: task.to_string(),
            description: text("description"),
            references: list("references"),
            completion_criteria: text("completion_criteria"),
            complexity: text("complexity"),
            priority: text("priority"),
            estimated_time_to_complete: text("estimated_time_to_complete"),
            frequency: text("frequency"),
            instructions: list("instructions"),
        })
    }
}

fn text_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn list_field(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(text_field).collect(),
        other => text_field(other).into_iter().collect(),
    }
}

/// Generates metadata for many tasks concurrently
pub struct TaskMetadataGenerator {
    client: Arc<dyn Completion>,
    max_concurrency: usize,
}

impl TaskMetadataGenerator {
    pub fn new(client: Arc<dyn Completion>, max_concurrency: usize) -> Self {
        Self {
            client,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Metadata in task order; tasks whose answer does not parse are skipped
    pub async fn generate(&self, checklist: &str, tasks: &[String]) -> Result<Vec<TaskMetadata>> {
        if checklist.trim().is_empty() {
            return Err(ChecklistError::InputValidation(
                "checklist title is required".to_string(),
            ));
        }

        let jobs: Vec<(String, String)> = tasks
            .iter()
            .map(|task| task.trim())
            .filter(|task| !task.is_empty())
            .map(|task| {
                (
                    task.to_string(),
                    TaskMetadataPrompt::generate(checklist.trim(), task),
                )
            })
            .collect();

        let client = Arc::clone(&self.client);
        let results = run_bounded(jobs, self.max_concurrency, move |(task, prompt)| {
            let client = Arc::clone(&client);
            async move {
                let value = complete_json(client.as_ref(), &prompt, TASK_METADATA_SCHEMA).await?;
                let metadata = value.and_then(|v| TaskMetadata::from_value(&task, &v));
                if metadata.is_none() {
                    tracing::warn!("No usable metadata for task '{}'", task);
                }
                Ok(metadata)
            }
        })
        .await?;

        Ok(results.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockCompletion;
    use serde_json::json;

    #[test]
    fn test_from_value_lenient() {
        let metadata = TaskMetadata::from_value(
            "Check exits",
            &json!({
                "description": "Walk every exit route",
                "references": ["https://example.org/fire", 42, null],
                "complexity": "Low",
                "estimated_time_to_complete": 30,
                "instructions": "Open each door"
            }),
        )
        .unwrap();

        assert_eq!(metadata.task, "Check exits");
        assert_eq!(metadata.references, vec!["https://example.org/fire", "42"]);
        assert_eq!(metadata.estimated_time_to_complete.as_deref(), Some("30"));
        assert_eq!(metadata.instructions, vec!["Open each door"]);
        assert!(metadata.frequency.is_none());
    }

    #[tokio::test]
    async fn test_generate_in_task_order_skipping_unparseable() {
        let client = Arc::new(
            MockCompletion::new()
                .with_response("Task: \"first\"", "```json\n{\"description\": \"one\"}\n```")
                .with_response("Task: \"second\"", "no json here")
                .with_response("Task: \"third\"", "{\"description\": \"three\", \"priority\": \"High\"}"),
        );
        let generator = TaskMetadataGenerator::new(client, 3);

        let tasks = vec!["first".to_string(), "second".to_string(), "third".to_string()];
        let metadata = generator.generate("Audit", &tasks).await.unwrap();

        let described: Vec<(&str, Option<&str>)> = metadata
            .iter()
            .map(|m| (m.task.as_str(), m.description.as_deref()))
            .collect();
        assert_eq!(described, vec![("first", Some("one")), ("third", Some("three"))]);
        assert_eq!(metadata[1].priority.as_deref(), Some("High"));
    }

    #[tokio::test]
    async fn test_checklist_required() {
        let generator = TaskMetadataGenerator::new(Arc::new(MockCompletion::new()), 2);
        assert!(generator.generate("", &["a".to_string()]).await.is_err());
    }
}
