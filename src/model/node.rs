use std::fmt;

use super::path::TreePath;

/// Maximum nesting depth, counting the owning task itself as the first level.
pub const MAX_DEPTH: usize = 5;

/// Deepest level a checklist node may occupy. Top-level nodes are level 1.
pub const MAX_NODE_DEPTH: usize = MAX_DEPTH - 1;

/// Stable handle to a node inside one [`Tree`].
///
/// Handles are assigned on insertion and never reused, so a handle to a
/// removed node stays dead instead of pointing at whatever was inserted later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single checklist entry
#[derive(Debug, Clone)]
pub struct TaskNode {
    pub(crate) title: String,
    pub(crate) completed: bool,
    pub(crate) remote_id: Option<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl TaskNode {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Identity assigned by the persistence layer, if this node has been saved
    pub fn remote_id(&self) -> Option<&str> {
        self.remote_id.as_deref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// The checklist attached to a task: an ordered list of top-level nodes,
/// each exclusively owning its subtree.
///
/// Nodes live in a flat arena addressed by [`NodeId`]. Removed nodes leave a
/// tombstone so their handles never come back to life. Every mutation made
/// through `ops::tree_ops` bumps [`Tree::version`].
///
/// Equality is structural: titles, completion flags, remote ids and child
/// order are compared; handle numbering and version are not.
#[derive(Debug, Clone, Default)]
pub struct Tree {
    slots: Vec<Option<TaskNode>>,
    roots: Vec<NodeId>,
    version: u64,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Monotonic change counter
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Top-level nodes in display order
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of live nodes at every depth
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn node(&self, id: NodeId) -> Option<&TaskNode> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Children of `parent`, or the top-level list when `parent` is `None`.
    /// A dead parent has no children.
    pub fn children_of(&self, parent: Option<NodeId>) -> &[NodeId] {
        match parent {
            None => &self.roots,
            Some(id) => self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[]),
        }
    }

    /// Level of a live node below the owning task (top-level nodes are 1)
    pub fn depth_of(&self, id: NodeId) -> Option<usize> {
        let mut depth = 1;
        let mut current = self.node(id)?;
        while let Some(parent) = current.parent {
            depth += 1;
            current = self.node(parent)?;
        }
        Some(depth)
    }

    /// Recompute the positional path of a live node against the current tree.
    pub fn path_of(&self, id: NodeId) -> Option<TreePath> {
        let mut segments = Vec::new();
        let mut current = id;
        loop {
            let node = self.node(current)?;
            let index = self
                .children_of(node.parent)
                .iter()
                .position(|c| *c == current)?;
            segments.push(index);
            match node.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        segments.reverse();
        Some(TreePath::from(segments))
    }

    /// Find the node carrying the given persistence-assigned id
    pub fn find_remote(&self, remote_id: &str) -> Option<NodeId> {
        self.preorder()
            .into_iter()
            .find(|id| self.node(*id).and_then(TaskNode::remote_id) == Some(remote_id))
    }

    /// All live nodes in pre-order: parents before children, siblings in order.
    pub fn preorder(&self) -> Vec<NodeId> {
        self.preorder_from(&self.roots)
    }

    /// Every node below `id` in pre-order, not including `id` itself
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        match self.node(id) {
            Some(node) => self.preorder_from(&node.children),
            None => Vec::new(),
        }
    }

    fn preorder_from(&self, start: &[NodeId]) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = start.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if let Some(node) = self.node(id) {
                out.push(id);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    // -----------------------------------------------------------------------
    // Mutation primitives. Callers validate depth and titles and bump the
    // version; these only keep the arena consistent.
    // -----------------------------------------------------------------------

    /// Append a node to the top-level list
    pub(crate) fn push_root(
        &mut self,
        title: String,
        completed: bool,
        remote_id: Option<String>,
    ) -> NodeId {
        let id = self.alloc(None, title, completed, remote_id);
        self.roots.push(id);
        id
    }

    /// Append a node under a live parent. `None` if the parent is gone.
    pub(crate) fn push_child(
        &mut self,
        parent: NodeId,
        title: String,
        completed: bool,
        remote_id: Option<String>,
    ) -> Option<NodeId> {
        if !self.contains(parent) {
            return None;
        }
        let id = self.alloc(Some(parent), title, completed, remote_id);
        self.node_mut(parent)?.children.push(id);
        Some(id)
    }

    fn alloc(
        &mut self,
        parent: Option<NodeId>,
        title: String,
        completed: bool,
        remote_id: Option<String>,
    ) -> NodeId {
        let id = NodeId(self.slots.len());
        self.slots.push(Some(TaskNode {
            title,
            completed,
            remote_id,
            parent,
            children: Vec::new(),
        }));
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut TaskNode> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Mutable children sequence of `parent` (or the top-level list)
    pub(crate) fn children_mut(&mut self, parent: Option<NodeId>) -> Option<&mut Vec<NodeId>> {
        match parent {
            None => Some(&mut self.roots),
            Some(id) => self.node_mut(id).map(|n| &mut n.children),
        }
    }

    /// Tombstone `id` and its whole subtree. The caller must already have
    /// unlinked `id` from its parent. Returns the number of nodes dropped.
    pub(crate) fn release(&mut self, id: NodeId) -> usize {
        let mut doomed = self.descendants(id);
        doomed.push(id);
        for dead in &doomed {
            if let Some(slot) = self.slots.get_mut(dead.0) {
                *slot = None;
            }
        }
        doomed.len()
    }

    pub(crate) fn touch(&mut self) {
        self.version += 1;
    }

    fn same_children(&self, ours: &[NodeId], other: &Tree, theirs: &[NodeId]) -> bool {
        ours.len() == theirs.len()
            && ours
                .iter()
                .zip(theirs)
                .all(|(a, b)| match (self.node(*a), other.node(*b)) {
                    (Some(x), Some(y)) => {
                        x.title == y.title
                            && x.completed == y.completed
                            && x.remote_id == y.remote_id
                            && self.same_children(&x.children, other, &y.children)
                    }
                    _ => false,
                })
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.same_children(&self.roots, other, &other.roots)
    }
}

impl Eq for Tree {}
