pub mod progress;
pub mod resolve;
pub mod session;
pub mod tree_ops;

use crate::model::node::{MAX_DEPTH, NodeId};
use crate::model::path::TreePath;

/// Structural errors raised while resolving or editing a checklist tree.
///
/// These are contract violations inside one edit session and are returned
/// to the caller instead of being absorbed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("no node at path {path}: index {index} is out of range at segment {segment}")]
    PathNotFound {
        path: TreePath,
        segment: usize,
        index: usize,
    },
    #[error("the empty path names the top-level list, not a node")]
    EmptyPath,
    #[error("cannot add a subtask under {path}: maximum nesting depth ({max} levels including the task) reached")]
    DepthExceeded { path: TreePath, max: usize },
    #[error("node {0} no longer exists in this tree")]
    NodeGone(NodeId),
    #[error("stale node reference: taken at tree version {taken}, tree is now at {current}")]
    StaleRef { taken: u64, current: u64 },
    #[error("title must not be blank")]
    InvalidTitle,
}

impl TreeError {
    pub(crate) fn depth_exceeded(path: TreePath) -> Self {
        TreeError::DepthExceeded {
            path,
            max: MAX_DEPTH,
        }
    }
}
