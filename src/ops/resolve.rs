use crate::model::node::{NodeId, TaskNode, Tree};
use crate::model::path::TreePath;

use super::TreeError;

/// What a path names in one tree snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    /// The empty path: the top-level list itself
    Root,
    Node(NodeRef),
}

/// A resolved node, pinned to the tree version it was resolved against.
///
/// Any mutation of the tree invalidates the reference; using it afterwards
/// fails with [`TreeError::StaleRef`] instead of touching a shifted sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRef {
    pub id: NodeId,
    /// `None` when the node sits in the top-level list
    pub parent: Option<NodeId>,
    /// Position among its siblings
    pub index: usize,
    /// Level below the owning task (top-level nodes are 1)
    pub depth: usize,
    version: u64,
}

impl NodeRef {
    /// Tree version this reference was taken at
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn ensure_current(&self, tree: &Tree) -> Result<(), TreeError> {
        if tree.version() == self.version {
            Ok(())
        } else {
            Err(TreeError::StaleRef {
                taken: self.version,
                current: tree.version(),
            })
        }
    }

    pub fn node<'t>(&self, tree: &'t Tree) -> Result<&'t TaskNode, TreeError> {
        self.ensure_current(tree)?;
        tree.node(self.id).ok_or(TreeError::NodeGone(self.id))
    }

    /// The parent's children sequence, which holds this node at `self.index`
    pub(crate) fn siblings_mut<'t>(
        &self,
        tree: &'t mut Tree,
    ) -> Result<&'t mut Vec<NodeId>, TreeError> {
        self.ensure_current(tree)?;
        tree.children_mut(self.parent)
            .ok_or(TreeError::NodeGone(self.id))
    }
}

/// Walk `path` from the top-level list. Every segment must be in range;
/// there is no fallback to a nearby node.
pub fn resolve(tree: &Tree, path: &TreePath) -> Result<Resolved, TreeError> {
    let mut parent = None;
    let mut found = None;
    for (segment, &index) in path.segments().iter().enumerate() {
        let id = *tree
            .children_of(parent)
            .get(index)
            .ok_or_else(|| TreeError::PathNotFound {
                path: path.clone(),
                segment,
                index,
            })?;
        found = Some(NodeRef {
            id,
            parent,
            index,
            depth: segment + 1,
            version: tree.version(),
        });
        parent = Some(id);
    }
    Ok(found.map_or(Resolved::Root, Resolved::Node))
}

/// Resolve a path that must name a node, not the top-level list
pub fn resolve_node(tree: &Tree, path: &TreePath) -> Result<NodeRef, TreeError> {
    match resolve(tree, path)? {
        Resolved::Root => Err(TreeError::EmptyPath),
        Resolved::Node(node) => Ok(node),
    }
}

pub fn exists(tree: &Tree, path: &TreePath) -> bool {
    resolve(tree, path).is_ok()
}
