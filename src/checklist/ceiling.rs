//! Task-count ceilings
//!
//! Prompts ask the model to stay under a limit; nothing guarantees it does.
//! [`CeilingMode::enforce`] trims an over-limit checklist deterministically.

use super::{ChecklistSpec, TaskSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Checklist-generation policy bounding the number of tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CeilingMode {
    /// Nested tasks with a minimum target and no maximum
    Detailed { min_tasks: usize },
    /// Top-level tasks only, at most `max_tasks` of them
    Flat { max_tasks: usize },
    /// Tasks and subtasks together at most `max_total`
    Combined { max_total: usize },
}

impl fmt::Display for CeilingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CeilingMode::Detailed { min_tasks } => write!(f, "detailed (at least {} tasks)", min_tasks),
            CeilingMode::Flat { max_tasks } => write!(f, "flat (at most {} tasks)", max_tasks),
            CeilingMode::Combined { max_total } => {
                write!(f, "combined (at most {} tasks and subtasks)", max_total)
            }
        }
    }
}

impl CeilingMode {
    /// Trim `spec` to the ceiling; returns how many tasks were removed
    ///
    /// Flat mode drops every subtask, then keeps the first `max_tasks`
    /// top-level tasks. Combined mode removes one leaf at a time: the lowest
    /// priority first, then the highest order number, then the one latest in
    /// pre-order. Detailed mode never removes anything. A ceiling of zero is
    /// treated as one so a checklist always keeps a task.
    pub fn enforce(&self, spec: &mut ChecklistSpec) -> usize {
        let before = spec.task_count();

        match *self {
            CeilingMode::Detailed { min_tasks } => {
                if before < min_tasks {
                    tracing::warn!(
                        "Checklist '{}' has {} tasks, fewer than the {} requested",
                        spec.title,
                        before,
                        min_tasks
                    );
                }
            }
            CeilingMode::Flat { max_tasks } => {
                for task in &mut spec.tasks {
                    task.subtasks.clear();
                }
                spec.tasks.truncate(max_tasks.max(1));
            }
            CeilingMode::Combined { max_total } => {
                let limit = max_total.max(1);
                while spec.task_count() > limit {
                    match weakest_leaf(&spec.tasks) {
                        Some(path) => remove_at(&mut spec.tasks, &path),
                        None => break,
                    }
                }
            }
        }

        before - spec.task_count()
    }
}

/// Rank used when trimming; unknown or missing priorities rank lowest
pub fn priority_rank(priority: Option<&str>) -> u8 {
    let Some(priority) = priority else {
        return 0;
    };

    match priority.trim().to_ascii_lowercase().as_str() {
        "critical" | "urgent" => 4,
        "high" => 3,
        "medium" | "normal" => 2,
        "low" => 1,
        _ => 0,
    }
}

/// Leaf eligible for removal, as a path of sibling indices
struct Leaf {
    path: Vec<usize>,
    rank: u8,
    order_number: usize,
    preorder: usize,
}

fn collect_leaves(tasks: &[TaskSpec], prefix: &mut Vec<usize>, counter: &mut usize, out: &mut Vec<Leaf>) {
    for (i, task) in tasks.iter().enumerate() {
        prefix.push(i);
        *counter += 1;

        if task.subtasks.is_empty() {
            out.push(Leaf {
                path: prefix.clone(),
                rank: priority_rank(task.priority.as_deref()),
                order_number: i,
                preorder: *counter,
            });
        } else {
            collect_leaves(&task.subtasks, prefix, counter, out);
        }

        prefix.pop();
    }
}

fn weakest_leaf(tasks: &[TaskSpec]) -> Option<Vec<usize>> {
    let mut leaves = Vec::new();
    collect_leaves(tasks, &mut Vec::new(), &mut 0, &mut leaves);

    leaves
        .into_iter()
        .min_by(|a, b| {
            a.rank
                .cmp(&b.rank)
                .then(b.order_number.cmp(&a.order_number))
                .then(b.preorder.cmp(&a.preorder))
        })
        .map(|leaf| leaf.path)
}

fn remove_at(tasks: &mut Vec<TaskSpec>, path: &[usize]) {
    match path {
        [] => {}
        [last] => {
            tasks.remove(*last);
        }
        [first, rest @ ..] => remove_at(&mut tasks[*first].subtasks, rest),
    }
}
