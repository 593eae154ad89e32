//! Status label vocabulary for a checklist

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Ordered set of 3 to 4 status labels
///
/// A "Not Applicable" label, when present, is always last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusIndicatorSet {
    labels: Vec<String>,
}

impl StatusIndicatorSet {
    pub const MIN_LABELS: usize = 3;
    pub const MAX_LABELS: usize = 4;

    /// Normalize raw labels; `None` when fewer than three usable labels remain
    ///
    /// Labels are trimmed, empty ones and case-insensitive duplicates
    /// dropped, the first "Not Applicable" label moved to the end, and the
    /// set capped at four.
    pub fn from_labels<I, S>(labels: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut regular = Vec::new();
        let mut not_applicable = None;

        for label in labels {
            let label = label.as_ref().trim();
            if label.is_empty() || !seen.insert(label.to_lowercase()) {
                continue;
            }

            if is_not_applicable(label) {
                not_applicable.get_or_insert_with(|| label.to_string());
            } else {
                regular.push(label.to_string());
            }
        }

        let keep = if not_applicable.is_some() {
            Self::MAX_LABELS - 1
        } else {
            Self::MAX_LABELS
        };
        regular.truncate(keep);
        regular.extend(not_applicable);

        if regular.len() < Self::MIN_LABELS {
            tracing::warn!(
                "Discarding status indicators, only {} usable labels",
                regular.len()
            );
            return None;
        }

        Some(Self { labels: regular })
    }

    /// Read `{"status_indicators": [...]}` or a bare array of strings
    pub fn from_value(value: &Value) -> Option<Self> {
        let items = match value {
            Value::Array(items) => items,
            Value::Object(object) => object.get("status_indicators")?.as_array()?,
            _ => return None,
        };

        Self::from_labels(items.iter().filter_map(Value::as_str))
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn is_not_applicable(label: &str) -> bool {
    let lower = label.to_lowercase();
    lower == "na" || lower.contains("n/a") || lower.starts_with("not applicable")
}
