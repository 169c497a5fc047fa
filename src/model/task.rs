use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Task priority, serialized with the labels the persistence layer stores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "Baixa")]
    Low,
    #[default]
    #[serde(rename = "Média")]
    Medium,
    #[serde(rename = "Alta")]
    High,
    #[serde(rename = "Crítica")]
    Critical,
}

impl Priority {
    /// The stored label
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "Baixa",
            Priority::Medium => "Média",
            Priority::High => "Alta",
            Priority::Critical => "Crítica",
        }
    }

    /// Parse a stored label or its English name, ignoring case and accents
    pub fn from_label(s: &str) -> Option<Priority> {
        match s.trim().to_lowercase().as_str() {
            "baixa" | "low" => Some(Priority::Low),
            "média" | "media" | "medium" => Some(Priority::Medium),
            "alta" | "high" => Some(Priority::High),
            "crítica" | "critica" | "critical" => Some(Priority::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Task fields edited alongside the checklist. The checklist itself lives
/// in a separate [`Tree`](super::node::Tree).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskMeta {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub due: Option<NaiveDate>,
}

impl TaskMeta {
    pub fn new(title: impl Into<String>) -> Self {
        TaskMeta {
            title: title.into(),
            ..TaskMeta::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_labels_round_trip() {
        for p in [
            Priority::Low,
            Priority::Medium,
            Priority::High,
            Priority::Critical,
        ] {
            assert_eq!(Priority::from_label(p.label()), Some(p));
        }
    }

    #[test]
    fn test_priority_lenient_parse() {
        assert_eq!(Priority::from_label("critica"), Some(Priority::Critical));
        assert_eq!(Priority::from_label(" HIGH "), Some(Priority::High));
        assert_eq!(Priority::from_label("MÉDIA"), Some(Priority::Medium));
        assert_eq!(Priority::from_label("urgent"), None);
    }

    #[test]
    fn test_priority_serde_uses_stored_labels() {
        let json = serde_json::to_string(&Priority::Critical).unwrap();
        assert_eq!(json, "\"Crítica\"");
        let back: Priority = serde_json::from_str("\"Média\"").unwrap();
        assert_eq!(back, Priority::Medium);
    }
}
