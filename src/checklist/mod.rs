//! Checklist structures decoded from model output
//!
//! The model is asked for `{"title": ..., "tasks": [...]}` but drifts from
//! that schema: nested lists come back under `tasks` or `subtasks`, nested
//! tasks are sometimes bare strings, and scalar fields arrive as numbers.
//! Everything is normalized here into [`ChecklistSpec`] before any tree is
//! built, so the builder only ever sees one shape.

mod ceiling;
mod status;
mod tree;

pub use ceiling::{priority_rank, CeilingMode};
pub use status::StatusIndicatorSet;
pub use tree::{ChecklistNode, ChecklistTreeBuilder};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys accepted for a nested task list, tried in order
const TASK_LIST_KEYS: [&str; 2] = ["tasks", "subtasks"];

/// Keys accepted for a task's time estimate, tried in order
const TIME_ESTIMATE_KEYS: [&str; 3] = ["time_estimate", "estimated_time_to_complete", "estimated_time"];

/// One task after normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_estimate: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<TaskSpec>,
}

impl TaskSpec {
    /// Create a task with only a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority: None,
            time_estimate: None,
            subtasks: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_subtasks(mut self, subtasks: Vec<TaskSpec>) -> Self {
        self.subtasks = subtasks;
        self
    }

    /// This task and all of its descendants
    pub fn node_count(&self) -> usize {
        1 + self.subtasks.iter().map(TaskSpec::node_count).sum::<usize>()
    }
}

/// A checklist in canonical form: a title and a non-empty task list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistSpec {
    pub title: String,
    pub tasks: Vec<TaskSpec>,
}

impl ChecklistSpec {
    /// Normalize parsed model output
    ///
    /// Returns `None` when the title is missing or empty, or when no usable
    /// task remains; that means there is nothing to persist.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let title = object.get("title").and_then(scalar_text)?;
        let tasks = task_list(object);

        if tasks.is_empty() {
            tracing::debug!("Checklist '{}' has no usable tasks", title);
            return None;
        }

        Some(Self { title, tasks })
    }

    /// Titles of the top-level tasks, in order
    pub fn top_level_titles(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.title.clone()).collect()
    }

    /// Number of tasks at every depth, excluding the checklist itself
    pub fn task_count(&self) -> usize {
        self.tasks.iter().map(TaskSpec::node_count).sum()
    }
}

/// Shapes a task list element can take
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTask {
    Title(String),
    Detailed(Map<String, Value>),
    Other(Value),
}

impl RawTask {
    fn into_spec(self) -> Option<TaskSpec> {
        match self {
            RawTask::Title(title) => {
                let title = title.trim();
                (!title.is_empty()).then(|| TaskSpec::new(title))
            }
            RawTask::Detailed(object) => {
                let title = object.get("title").and_then(scalar_text)?;
                Some(TaskSpec {
                    title,
                    description: object.get("description").and_then(scalar_text),
                    priority: object.get("priority").and_then(scalar_text),
                    time_estimate: TIME_ESTIMATE_KEYS
                        .iter()
                        .find_map(|key| object.get(*key).and_then(scalar_text)),
                    subtasks: task_list(&object),
                })
            }
            RawTask::Other(value) => match value {
                Value::Number(_) | Value::Bool(_) => scalar_text(&value).map(TaskSpec::new),
                _ => None,
            },
        }
    }
}

/// First non-empty nested list among the accepted keys
fn task_list(object: &Map<String, Value>) -> Vec<TaskSpec> {
    for key in TASK_LIST_KEYS {
        let Some(Value::Array(items)) = object.get(key) else {
            continue;
        };

        let tasks: Vec<TaskSpec> = items
            .iter()
            .filter_map(|item| RawTask::deserialize(item).ok())
            .filter_map(RawTask::into_spec)
            .collect();

        if !tasks.is_empty() {
            return tasks;
        }
    }
    Vec::new()
}

/// Text of a scalar field; strings are trimmed and must be non-empty
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
