//! Wire schema shared with the persistence layer.
//!
//! Field names on the wire are the ones the stored documents use
//! (`titulo`, `concluido`, `subtarefas`, ...); the Rust side uses English
//! names and maps them with `serde(rename)`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::task::Priority;

/// One checklist node, nested arbitrarily
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskNodeWire {
    /// Assigned by the persistence layer; absent on nodes that were never saved
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "concluido", default)]
    pub completed: bool,
    #[serde(rename = "subtarefas", default)]
    pub children: Vec<TaskNodeWire>,
}

impl TaskNodeWire {
    pub fn leaf(title: impl Into<String>) -> Self {
        TaskNodeWire {
            id: None,
            title: title.into(),
            completed: false,
            children: Vec::new(),
        }
    }
}

/// Body of `create_task` / `update_task`: task fields plus the full checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPayload {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descricao", default)]
    pub description: String,
    #[serde(rename = "prioridade", default)]
    pub priority: Priority,
    #[serde(rename = "prazo", default, skip_serializing_if = "Option::is_none")]
    pub due: Option<NaiveDate>,
    #[serde(rename = "subtarefas", default)]
    pub subtasks: Vec<TaskNodeWire>,
}

/// A task as the store keeps it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTask {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub payload: TaskPayload,
    #[serde(rename = "criadoEm")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "atualizadoEm")]
    pub updated_at: DateTime<Utc>,
}
