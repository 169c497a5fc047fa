use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

use crate::codec::tree_codec;
use crate::codec::wire::{StoredTask, TaskNodeWire, TaskPayload};
use crate::io::lock::{LockError, StoreLock};
use crate::model::config::StoreConfig;
use crate::ops::TreeError;
use crate::ops::tree_ops;

/// Error type for the persistence collaborator
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("task not found: {0}")]
    TaskNotFound(String),
    #[error("subtask not found: {0}")]
    SubtaskNotFound(String),
    #[error("title must not be blank")]
    BlankTitle,
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("task store {path} is not valid JSON: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not serialize tasks for {path}: {source}")]
    SerializeError {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Lock(#[from] LockError),
}

/// The persistence side of task editing. Saves are whole-task replacements;
/// the store is responsible for making each one atomic.
pub trait TaskStore {
    fn list_tasks(&self) -> Result<Vec<StoredTask>, StoreError>;

    fn get_task(&self, id: &str) -> Result<StoredTask, StoreError>;

    /// Store a new task, assigning ids to it and to every checklist node
    fn create_task(&mut self, payload: TaskPayload) -> Result<StoredTask, StoreError>;

    /// Replace a task's fields and entire checklist. Nodes without an id get one.
    fn update_task(&mut self, id: &str, payload: TaskPayload) -> Result<StoredTask, StoreError>;

    /// Append one unchecked subtask without a full edit session: under the
    /// node whose id is `parent_subtask_id`, or at the top level.
    fn add_subtask(
        &mut self,
        task_id: &str,
        title: &str,
        parent_subtask_id: Option<&str>,
    ) -> Result<StoredTask, StoreError>;
}

/// Task store backed by a single JSON file holding an array of tasks.
///
/// Every write takes the store lock, re-reads the file, applies the change
/// and atomically replaces the file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_timeout: Duration,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, lock_timeout: Duration) -> Self {
        JsonFileStore {
            path: path.into(),
            lock_timeout,
        }
    }

    /// Open the store configured for the workspace at `workspace_dir`
    pub fn open(workspace_dir: &Path, config: &StoreConfig) -> Self {
        Self::new(
            workspace_dir.join(&config.file),
            Duration::from_millis(config.lock_timeout_ms),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<StoredTask>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path).map_err(|e| StoreError::ReadError {
            path: self.path.clone(),
            source: e,
        })?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text).map_err(|e| StoreError::Corrupt {
            path: self.path.clone(),
            source: e,
        })
    }

    fn persist(&self, tasks: &[StoredTask]) -> Result<(), StoreError> {
        let content = to_store_json(&self.path, tasks)?;
        atomic_write(&self.path, content.as_bytes()).map_err(|e| StoreError::WriteError {
            path: self.path.clone(),
            source: e,
        })
    }

    /// Run `f` against the current task list under the lock, then persist.
    /// Nothing is written if `f` fails.
    fn modify<T>(
        &mut self,
        f: impl FnOnce(&mut Vec<StoredTask>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _lock = StoreLock::acquire(&self.path, self.lock_timeout)?;
        let mut tasks = self.load()?;
        let out = f(&mut tasks)?;
        self.persist(&tasks)?;
        Ok(out)
    }
}

impl TaskStore for JsonFileStore {
    fn list_tasks(&self) -> Result<Vec<StoredTask>, StoreError> {
        self.load()
    }

    fn get_task(&self, id: &str) -> Result<StoredTask, StoreError> {
        self.load()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))
    }

    fn create_task(&mut self, mut payload: TaskPayload) -> Result<StoredTask, StoreError> {
        assign_ids(&mut payload.subtasks);
        let now = Utc::now();
        let task = StoredTask {
            id: new_id(),
            payload,
            created_at: now,
            updated_at: now,
        };
        let created = self.modify(|tasks| {
            tasks.push(task.clone());
            Ok(task)
        })?;
        info!(task = %created.id, "created task");
        Ok(created)
    }

    fn update_task(&mut self, id: &str, mut payload: TaskPayload) -> Result<StoredTask, StoreError> {
        assign_ids(&mut payload.subtasks);
        let updated = self.modify(|tasks| {
            let task = tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| StoreError::TaskNotFound(id.to_string()))?;
            task.payload = payload;
            task.updated_at = Utc::now();
            Ok(task.clone())
        })?;
        info!(task = %updated.id, "replaced task");
        Ok(updated)
    }

    fn add_subtask(
        &mut self,
        task_id: &str,
        title: &str,
        parent_subtask_id: Option<&str>,
    ) -> Result<StoredTask, StoreError> {
        if title.trim().is_empty() {
            return Err(StoreError::BlankTitle);
        }
        let updated = self.modify(|tasks| {
            let task = tasks
                .iter_mut()
                .find(|t| t.id == task_id)
                .ok_or_else(|| StoreError::TaskNotFound(task_id.to_string()))?;

            // Same mutation path an edit session takes
            let mut tree = tree_codec::decode(&task.payload.subtasks);
            let parent = match parent_subtask_id {
                None => None,
                Some(sub_id) => Some(
                    tree.find_remote(sub_id)
                        .ok_or_else(|| StoreError::SubtaskNotFound(sub_id.to_string()))?,
                ),
            };
            tree_ops::add_child_to(&mut tree, parent, title)?;

            task.payload.subtasks = tree_codec::encode(&tree);
            assign_ids(&mut task.payload.subtasks);
            task.updated_at = Utc::now();
            Ok(task.clone())
        })?;
        debug!(task = %task_id, parent = ?parent_subtask_id, "appended subtask");
        Ok(updated)
    }
}

/// Pretty JSON with a trailing newline, as written to the store file
fn to_store_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<String, StoreError> {
    let mut content =
        serde_json::to_string_pretty(value).map_err(|e| StoreError::SerializeError {
            path: path.to_path_buf(),
            source: e,
        })?;
    content.push('\n');
    Ok(content)
}

/// Give every node that lacks one a fresh id
fn assign_ids(nodes: &mut [TaskNodeWire]) {
    for node in nodes {
        if node.id.is_none() {
            node.id = Some(new_id());
        }
        assign_ids(&mut node.children);
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Write to a sibling temp file, then rename over `path`.
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::tree_codec::{decode, encode};
    use crate::model::path::TreePath;
    use crate::model::task::Priority;
    use crate::ops::tree_ops::add_child;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store_in(tmp: &TempDir) -> JsonFileStore {
        JsonFileStore::new(tmp.path().join("tasks.json"), Duration::from_secs(1))
    }

    fn payload(title: &str, subtasks: Vec<TaskNodeWire>) -> TaskPayload {
        TaskPayload {
            title: title.to_string(),
            description: String::new(),
            priority: Priority::Medium,
            due: None,
            subtasks,
        }
    }

    fn groceries_wire() -> Vec<TaskNodeWire> {
        vec![TaskNodeWire {
            id: None,
            title: "Buy groceries".into(),
            completed: false,
            children: vec![TaskNodeWire::leaf("Milk")],
        }]
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let tmp = TempDir::new().unwrap();
        assert!(store_in(&tmp).list_tasks().unwrap().is_empty());
    }

    #[test]
    fn test_create_assigns_ids_everywhere() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let task = store.create_task(payload("Shop", groceries_wire())).unwrap();

        assert!(!task.id.is_empty());
        let top = &task.payload.subtasks[0];
        assert!(top.id.is_some());
        assert!(top.children[0].id.is_some());
        assert_ne!(top.id, top.children[0].id);

        assert_eq!(store.get_task(&task.id).unwrap(), task);
    }

    #[test]
    fn test_update_replaces_whole_tree_and_keeps_ids() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let created = store.create_task(payload("Shop", groceries_wire())).unwrap();
        let milk_id = created.payload.subtasks[0].children[0].id.clone();

        let mut tree = decode(&created.payload.subtasks);
        add_child(&mut tree, &TreePath::from(vec![0]), "Eggs").unwrap();
        let mut next = created.payload.clone();
        next.subtasks = encode(&tree);

        let updated = store.update_task(&created.id, next).unwrap();
        let children = &updated.payload.subtasks[0].children;
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].id, milk_id);
        assert!(children[1].id.is_some());
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(store.list_tasks().unwrap().len(), 1);
    }

    #[test]
    fn test_update_missing_task() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let err = store.update_task("nope", payload("x", vec![])).unwrap_err();
        assert!(matches!(err, StoreError::TaskNotFound(id) if id == "nope"));
    }

    #[test]
    fn test_add_subtask_under_parent_and_top_level() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let task = store.create_task(payload("Shop", groceries_wire())).unwrap();
        let parent_id = task.payload.subtasks[0].id.clone().unwrap();

        let task = store.add_subtask(&task.id, "Eggs", Some(&parent_id)).unwrap();
        assert_eq!(task.payload.subtasks[0].children[1].title, "Eggs");
        assert!(task.payload.subtasks[0].children[1].id.is_some());

        let task = store.add_subtask(&task.id, " Chores ", None).unwrap();
        assert_eq!(task.payload.subtasks[1].title, "Chores");
    }

    #[test]
    fn test_add_subtask_errors_leave_file_alone() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let task = store.create_task(payload("Shop", groceries_wire())).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        assert!(matches!(
            store.add_subtask(&task.id, "  ", None),
            Err(StoreError::BlankTitle)
        ));
        assert!(matches!(
            store.add_subtask(&task.id, "Eggs", Some("ghost")),
            Err(StoreError::SubtaskNotFound(_))
        ));
        assert!(matches!(
            store.add_subtask("ghost", "Eggs", None),
            Err(StoreError::TaskNotFound(_))
        ));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn test_add_subtask_respects_depth_limit() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let mut task = store.create_task(payload("Deep", vec![])).unwrap();
        let mut parent: Option<String> = None;
        for level in 1..=4 {
            task = store
                .add_subtask(&task.id, &format!("level {}", level), parent.as_deref())
                .unwrap();
            let mut node = &task.payload.subtasks[0];
            while let Some(child) = node.children.first() {
                node = child;
            }
            parent = node.id.clone();
        }

        let err = store
            .add_subtask(&task.id, "level 5", parent.as_deref())
            .unwrap_err();
        assert!(matches!(err, StoreError::Tree(TreeError::DepthExceeded { .. })));
    }

    #[test]
    fn test_corrupt_file() {
        let tmp = TempDir::new().unwrap();
        let store = store_in(&tmp);
        fs::write(store.path(), "{ not json").unwrap();
        assert!(matches!(store.list_tasks(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn test_serialize_failure_is_not_reported_as_corrupt() {
        use std::collections::HashMap;

        // JSON object keys must be strings
        let unserializable: HashMap<(u8, u8), u8> = HashMap::from([((1, 2), 3)]);
        let err = to_store_json(Path::new("tasks.json"), &unserializable).unwrap_err();
        assert!(matches!(err, StoreError::SerializeError { .. }));
        assert!(err.to_string().starts_with("could not serialize tasks"));

        let ok = to_store_json(Path::new("tasks.json"), &Vec::<StoredTask>::new()).unwrap();
        assert_eq!(ok, "[]\n");
    }

    #[test]
    fn test_atomic_write_overwrites() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out.json");
        atomic_write(&path, b"[]").unwrap();
        atomic_write(&path, b"[1]").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[1]");
    }
}
