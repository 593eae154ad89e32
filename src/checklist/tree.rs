//! Flattening a checklist into persistable node records

use super::{CeilingMode, ChecklistSpec, TaskSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One persisted checklist row
///
/// The root carries the checklist title, has no parent, and is its own
/// `checklist_root_id`. Every other node points at its immediate parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistNode {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<String>,
    pub time_estimate: Option<String>,
    /// Zero-based position among siblings
    pub order_number: usize,
    pub parent_id: Option<String>,
    pub checklist_root_id: String,
    pub project_id: Option<String>,
}

impl ChecklistNode {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Builds pre-ordered node lists from checklists
#[derive(Debug, Clone, Default)]
pub struct ChecklistTreeBuilder {
    project_id: Option<String>,
    ceiling: Option<CeilingMode>,
}

impl ChecklistTreeBuilder {
    pub fn new(project_id: Option<String>) -> Self {
        Self {
            project_id,
            ceiling: None,
        }
    }

    /// Enforce a task ceiling before building
    pub fn with_ceiling(mut self, ceiling: CeilingMode) -> Self {
        self.ceiling = Some(ceiling);
        self
    }

    /// Normalize parsed output and build; `None` when there is nothing to persist
    pub fn build_from_value(&self, value: &Value) -> Option<Vec<ChecklistNode>> {
        let spec = ChecklistSpec::from_value(value)?;
        Some(self.build(spec))
    }

    /// Build the node list, root first, every parent before its descendants
    pub fn build(&self, mut spec: ChecklistSpec) -> Vec<ChecklistNode> {
        if let Some(ceiling) = &self.ceiling {
            let dropped = ceiling.enforce(&mut spec);
            if dropped > 0 {
                tracing::info!(
                    "Dropped {} tasks from '{}' to honor {}",
                    dropped,
                    spec.title,
                    ceiling
                );
            }
        }

        let root_id = uuid::Uuid::new_v4().to_string();
        let mut nodes = Vec::with_capacity(spec.task_count() + 1);

        nodes.push(ChecklistNode {
            id: root_id.clone(),
            title: spec.title,
            description: None,
            priority: None,
            time_estimate: None,
            order_number: 0,
            parent_id: None,
            checklist_root_id: root_id.clone(),
            project_id: self.project_id.clone(),
        });

        self.push_children(&mut nodes, spec.tasks, &root_id, &root_id);

        tracing::debug!("Built checklist tree with {} nodes", nodes.len());
        nodes
    }

    fn push_children(
        &self,
        nodes: &mut Vec<ChecklistNode>,
        tasks: Vec<TaskSpec>,
        parent_id: &str,
        root_id: &str,
    ) {
        for (order_number, task) in tasks.into_iter().enumerate() {
            let id = uuid::Uuid::new_v4().to_string();

            nodes.push(ChecklistNode {
                id: id.clone(),
                title: task.title,
                description: task.description,
                priority: task.priority,
                time_estimate: task.time_estimate,
                order_number,
                parent_id: Some(parent_id.to_string()),
                checklist_root_id: root_id.to_string(),
                project_id: self.project_id.clone(),
            });

            self.push_children(nodes, task.subtasks, &id, root_id);
        }
    }
}
