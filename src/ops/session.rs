use tracing::{debug, info, warn};

use crate::codec::tree_codec::{decode_payload, encode_payload};
use crate::codec::wire::{StoredTask, TaskPayload};
use crate::io::store::{StoreError, TaskStore};
use crate::model::node::{NodeId, Tree};
use crate::model::path::TreePath;
use crate::model::task::TaskMeta;
use crate::ops::progress::{Progress, ProgressCache};
use crate::ops::{TreeError, tree_ops};

/// Where a session's edits land when saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTarget {
    /// Not persisted yet; saving creates the task
    New,
    /// Saving replaces this stored task
    Existing(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("a save is already in flight for this task")]
    SaveInFlight,
    #[error("no save is in flight")]
    NoSaveInFlight,
    #[error("task title must not be blank")]
    BlankTaskTitle,
    #[error("save failed, local edits kept: {0}")]
    SaveFailed(#[source] StoreError),
}

/// One task opened for editing.
///
/// The session owns a private deep copy of the checklist; nothing reaches
/// the store until [`save`](EditSession::save), which sends the whole tree.
/// A failed save leaves the local copy untouched so it can be retried.
/// Dropping the session (or calling [`discard`](EditSession::discard))
/// cancels the edit.
#[derive(Debug)]
pub struct EditSession {
    target: SessionTarget,
    pub meta: TaskMeta,
    tree: Tree,
    progress: ProgressCache,
    saving: bool,
}

impl EditSession {
    /// Start editing a task that does not exist yet
    pub fn new_task(title: impl Into<String>) -> Self {
        EditSession {
            target: SessionTarget::New,
            meta: TaskMeta::new(title),
            tree: Tree::new(),
            progress: ProgressCache::default(),
            saving: false,
        }
    }

    /// Start editing a stored task
    pub fn open(task: &StoredTask) -> Self {
        let (meta, tree) = decode_payload(&task.payload);
        debug!(task = %task.id, nodes = tree.len(), "opened edit session");
        EditSession {
            target: SessionTarget::Existing(task.id.clone()),
            meta,
            tree,
            progress: ProgressCache::default(),
            saving: false,
        }
    }

    pub fn target(&self) -> &SessionTarget {
        &self.target
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Rollup over the current checklist, recomputed only after changes
    pub fn progress(&mut self) -> Progress {
        self.progress.get(&self.tree)
    }

    pub fn add_child(&mut self, path: &TreePath, title: &str) -> Result<Option<NodeId>, TreeError> {
        tree_ops::add_child(&mut self.tree, path, title)
    }

    pub fn remove_at(&mut self, path: &TreePath) -> Result<usize, TreeError> {
        tree_ops::remove_at(&mut self.tree, path)
    }

    pub fn set_completed(&mut self, path: &TreePath, completed: bool) -> Result<(), TreeError> {
        tree_ops::set_completed(&mut self.tree, path, completed)
    }

    pub fn toggle_completed(&mut self, path: &TreePath) -> Result<bool, TreeError> {
        tree_ops::toggle_completed(&mut self.tree, path)
    }

    pub fn rename(&mut self, path: &TreePath, title: &str) -> Result<(), TreeError> {
        tree_ops::rename(&mut self.tree, path, title)
    }

    pub fn can_add_child(&self, path: &TreePath) -> bool {
        tree_ops::can_add_child(&self.tree, path)
    }

    /// The payload a save would send right now
    pub fn payload(&self) -> TaskPayload {
        encode_payload(&self.meta, &self.tree)
    }

    pub fn is_saving(&self) -> bool {
        self.saving
    }

    /// Mark a save as in flight and hand back the payload to send.
    /// Only one save may be in flight at a time.
    pub fn begin_save(&mut self) -> Result<TaskPayload, SessionError> {
        if self.saving {
            return Err(SessionError::SaveInFlight);
        }
        if self.meta.title.trim().is_empty() {
            return Err(SessionError::BlankTaskTitle);
        }
        self.saving = true;
        Ok(self.payload())
    }

    /// Settle the in-flight save. On success the session now tracks the
    /// stored task, with the ids the store assigned. On failure the local
    /// tree and fields stay exactly as they were.
    pub fn finish_save(
        &mut self,
        outcome: Result<StoredTask, StoreError>,
    ) -> Result<StoredTask, SessionError> {
        if !self.saving {
            return Err(SessionError::NoSaveInFlight);
        }
        self.saving = false;
        match outcome {
            Ok(stored) => {
                info!(task = %stored.id, nodes = self.tree.len(), "saved task");
                (self.meta, self.tree) = decode_payload(&stored.payload);
                self.progress.invalidate();
                self.target = SessionTarget::Existing(stored.id.clone());
                Ok(stored)
            }
            Err(e) => {
                warn!(error = %e, "save failed; keeping local edits");
                Err(SessionError::SaveFailed(e))
            }
        }
    }

    /// Send the whole task to `store`: create for a new task, full
    /// replacement for an existing one.
    pub fn save<S: TaskStore + ?Sized>(&mut self, store: &mut S) -> Result<StoredTask, SessionError> {
        let payload = self.begin_save()?;
        let outcome = match &self.target {
            SessionTarget::New => store.create_task(payload),
            SessionTarget::Existing(id) => store.update_task(id, payload),
        };
        self.finish_save(outcome)
    }

    /// Cancel the edit. Nothing was persisted, so there is nothing to undo.
    pub fn discard(self) {
        debug!(session = ?self.target, "discarded edit session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::wire::TaskNodeWire;
    use crate::io::store::JsonFileStore;
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use tempfile::TempDir;

    fn path(segments: &[usize]) -> TreePath {
        TreePath::from(segments)
    }

    /// Store whose writes always fail, as if the task was deleted elsewhere
    struct RejectingStore;

    impl TaskStore for RejectingStore {
        fn list_tasks(&self) -> Result<Vec<StoredTask>, StoreError> {
            Ok(Vec::new())
        }
        fn get_task(&self, id: &str) -> Result<StoredTask, StoreError> {
            Err(StoreError::TaskNotFound(id.to_string()))
        }
        fn create_task(&mut self, _payload: TaskPayload) -> Result<StoredTask, StoreError> {
            Err(StoreError::TaskNotFound("new".to_string()))
        }
        fn update_task(&mut self, id: &str, _payload: TaskPayload) -> Result<StoredTask, StoreError> {
            Err(StoreError::TaskNotFound(id.to_string()))
        }
        fn add_subtask(
            &mut self,
            task_id: &str,
            _title: &str,
            _parent_subtask_id: Option<&str>,
        ) -> Result<StoredTask, StoreError> {
            Err(StoreError::TaskNotFound(task_id.to_string()))
        }
    }

    fn temp_store(tmp: &TempDir) -> JsonFileStore {
        JsonFileStore::new(tmp.path().join("tasks.json"), Duration::from_secs(1))
    }

    #[test]
    fn test_new_task_save_creates_then_updates() {
        let tmp = TempDir::new().unwrap();
        let mut store = temp_store(&tmp);

        let mut session = EditSession::new_task("Weekly shop");
        session.add_child(&TreePath::root(), "Buy groceries").unwrap();
        session.add_child(&path(&[0]), "Milk").unwrap();
        let created = session.save(&mut store).unwrap();

        assert_eq!(session.target(), &SessionTarget::Existing(created.id.clone()));
        // Session now carries the assigned ids
        let top = session.tree().roots()[0];
        assert!(session.tree().node(top).unwrap().remote_id().is_some());

        session.toggle_completed(&path(&[0, 0])).unwrap();
        let updated = session.save(&mut store).unwrap();
        assert_eq!(updated.id, created.id);
        assert!(updated.payload.subtasks[0].children[0].completed);
        assert_eq!(store.list_tasks().unwrap().len(), 1);
    }

    #[test]
    fn test_progress_tracks_edits() {
        let mut session = EditSession::new_task("Weekly shop");
        assert_eq!(session.progress(), Progress::default());

        session.add_child(&TreePath::root(), "Buy groceries").unwrap();
        session.add_child(&path(&[0]), "Milk").unwrap();
        assert_eq!(session.progress().total, 2);

        session.set_completed(&path(&[0, 0]), true).unwrap();
        assert_eq!(session.progress().percent, 50);

        session.remove_at(&path(&[0])).unwrap();
        assert_eq!(session.progress(), Progress::default());
    }

    #[test]
    fn test_failed_save_keeps_local_edits() {
        let mut session = EditSession::new_task("Weekly shop");
        session.add_child(&TreePath::root(), "Buy groceries").unwrap();
        let before = session.tree().clone();

        let err = session.save(&mut RejectingStore).unwrap_err();
        assert!(matches!(err, SessionError::SaveFailed(_)));
        assert_eq!(session.tree(), &before);
        assert_eq!(session.target(), &SessionTarget::New);
        assert!(!session.is_saving());

        // Retry against a working store succeeds
        let tmp = TempDir::new().unwrap();
        let saved = session.save(&mut temp_store(&tmp)).unwrap();
        assert_eq!(saved.payload.subtasks[0].title, "Buy groceries");
    }

    #[test]
    fn test_one_save_in_flight() {
        let mut session = EditSession::new_task("Weekly shop");
        session.begin_save().unwrap();
        assert!(session.is_saving());
        assert!(matches!(
            session.begin_save(),
            Err(SessionError::SaveInFlight)
        ));

        let err = session
            .finish_save(Err(StoreError::TaskNotFound("t".into())))
            .unwrap_err();
        assert!(matches!(err, SessionError::SaveFailed(_)));
        assert!(session.begin_save().is_ok());
    }

    #[test]
    fn test_finish_without_begin() {
        let mut session = EditSession::new_task("x");
        assert!(matches!(
            session.finish_save(Err(StoreError::BlankTitle)),
            Err(SessionError::NoSaveInFlight)
        ));
    }

    #[test]
    fn test_blank_task_title_is_not_saved() {
        let mut session = EditSession::new_task("   ");
        assert!(matches!(
            session.begin_save(),
            Err(SessionError::BlankTaskTitle)
        ));
        assert!(!session.is_saving());
    }

    #[test]
    fn test_discarded_session_leaves_store_untouched() {
        let tmp = TempDir::new().unwrap();
        let mut store = temp_store(&tmp);
        let mut setup = EditSession::new_task("Weekly shop");
        setup.add_child(&TreePath::root(), "Buy groceries").unwrap();
        let stored = setup.save(&mut store).unwrap();

        let mut session = EditSession::open(&stored);
        session.remove_at(&path(&[0])).unwrap();
        session.meta.title = "Changed".into();
        session.discard();

        assert_eq!(store.get_task(&stored.id).unwrap(), stored);
    }

    #[test]
    fn test_session_add_matches_quick_add() {
        let tmp = TempDir::new().unwrap();
        let mut store = temp_store(&tmp);
        let mut setup = EditSession::new_task("Weekly shop");
        setup.add_child(&TreePath::root(), "Buy groceries").unwrap();
        let stored = setup.save(&mut store).unwrap();
        let parent_id = stored.payload.subtasks[0].id.clone().unwrap();

        let mut session = EditSession::open(&stored);
        session.add_child(&path(&[0]), "Milk").unwrap();
        let via_session = session.payload().subtasks;

        let via_endpoint = store
            .add_subtask(&stored.id, "Milk", Some(&parent_id))
            .unwrap()
            .payload
            .subtasks;

        // Same shape; only the id the endpoint assigned to the new node differs
        let mut normalized = via_endpoint.clone();
        normalized[0].children[0].id = None;
        assert_eq!(via_session, normalized);
        assert_eq!(via_session[0].children[0], TaskNodeWire::leaf("Milk"));
    }
}
