use tracing::debug;

use crate::model::node::{MAX_NODE_DEPTH, NodeId, Tree};
use crate::model::path::TreePath;
use crate::ops::resolve::{Resolved, resolve, resolve_node};

use super::TreeError;

// ---------------------------------------------------------------------------
// Structure
// ---------------------------------------------------------------------------

/// Append a new, unchecked leaf under the node at `path`, or to the
/// top-level list when `path` is empty. Returns the new node's handle.
///
/// An unresolvable path or a child that would sit below [`MAX_NODE_DEPTH`]
/// is an error, with the tree unchanged. Those checks run first; only then
/// is a blank title ignored, leaving the tree alone and returning `Ok(None)`.
pub fn add_child(
    tree: &mut Tree,
    path: &TreePath,
    title: &str,
) -> Result<Option<NodeId>, TreeError> {
    let parent = match resolve(tree, path)? {
        Resolved::Root => None,
        Resolved::Node(node) => Some(node.id),
    };
    if path.depth() >= MAX_NODE_DEPTH {
        return Err(TreeError::depth_exceeded(path.clone()));
    }
    let Some(title) = clean_title(title) else {
        debug!(%path, "ignoring subtask with blank title");
        return Ok(None);
    };
    append(tree, parent, title).map(Some)
}

/// Same as [`add_child`], addressed by handle instead of path
pub fn add_child_to(
    tree: &mut Tree,
    parent: Option<NodeId>,
    title: &str,
) -> Result<Option<NodeId>, TreeError> {
    if let Some(id) = parent {
        let depth = tree.depth_of(id).ok_or(TreeError::NodeGone(id))?;
        if depth >= MAX_NODE_DEPTH {
            let path = tree.path_of(id).unwrap_or_default();
            return Err(TreeError::depth_exceeded(path));
        }
    }
    let Some(title) = clean_title(title) else {
        debug!("ignoring subtask with blank title");
        return Ok(None);
    };
    append(tree, parent, title).map(Some)
}

fn append(tree: &mut Tree, parent: Option<NodeId>, title: String) -> Result<NodeId, TreeError> {
    let id = match parent {
        None => tree.push_root(title, false, None),
        Some(p) => tree
            .push_child(p, title, false, None)
            .ok_or(TreeError::NodeGone(p))?,
    };
    tree.touch();
    debug!(node = %id, version = tree.version(), "added subtask");
    Ok(id)
}

/// Remove the node at `path` together with its subtree. Later siblings
/// shift down by one. Returns how many nodes were removed.
pub fn remove_at(tree: &mut Tree, path: &TreePath) -> Result<usize, TreeError> {
    let target = resolve_node(tree, path)?;
    let siblings = target.siblings_mut(tree)?;
    siblings.remove(target.index);
    let removed = tree.release(target.id);
    tree.touch();
    debug!(%path, removed, version = tree.version(), "removed subtask");
    Ok(removed)
}

/// Same as [`remove_at`], addressed by handle
pub fn remove_node(tree: &mut Tree, id: NodeId) -> Result<usize, TreeError> {
    let path = tree.path_of(id).ok_or(TreeError::NodeGone(id))?;
    remove_at(tree, &path)
}

/// Whether the "add subtask" affordance should be offered for `path`
pub fn can_add_child(tree: &Tree, path: &TreePath) -> bool {
    path.depth() < MAX_NODE_DEPTH && resolve(tree, path).is_ok()
}

// ---------------------------------------------------------------------------
// Node state
// ---------------------------------------------------------------------------

/// Set one node's completion flag. Ancestors and descendants are untouched.
pub fn set_completed(tree: &mut Tree, path: &TreePath, completed: bool) -> Result<(), TreeError> {
    let target = resolve_node(tree, path)?;
    let node = tree
        .node_mut(target.id)
        .ok_or(TreeError::NodeGone(target.id))?;
    if node.completed != completed {
        node.completed = completed;
        tree.touch();
    }
    Ok(())
}

/// Flip one node's completion flag, returning the new value
pub fn toggle_completed(tree: &mut Tree, path: &TreePath) -> Result<bool, TreeError> {
    let current = resolve_node(tree, path)?.node(tree)?.completed();
    set_completed(tree, path, !current)?;
    Ok(!current)
}

/// Retitle a node. Unlike insertion, a blank title here is an error.
pub fn rename(tree: &mut Tree, path: &TreePath, title: &str) -> Result<(), TreeError> {
    let title = clean_title(title).ok_or(TreeError::InvalidTitle)?;
    let target = resolve_node(tree, path)?;
    let node = tree
        .node_mut(target.id)
        .ok_or(TreeError::NodeGone(target.id))?;
    if node.title != title {
        node.title = title;
        tree.touch();
    }
    Ok(())
}

fn clean_title(title: &str) -> Option<String> {
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
