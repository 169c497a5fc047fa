use serde::Serialize;

use crate::model::node::{NodeId, Tree};

/// Completion rollup for a checklist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub total: usize,
    pub completed: usize,
    /// `completed / total` as a whole percentage, halves rounded up; 0 when empty
    pub percent: u8,
}

impl Progress {
    fn from_counts(total: usize, completed: usize) -> Self {
        Progress {
            total,
            completed,
            percent: percent_of(completed, total),
        }
    }

    /// True when there is at least one node and every node is checked
    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

/// Count every checklist node at every depth. The owning task is not a node
/// and is not counted. A parent's flag and its children's flags are counted
/// independently.
pub fn aggregate(tree: &Tree) -> Progress {
    count(tree, tree.preorder())
}

/// Progress of the nodes below `id`, not counting `id` itself
pub fn aggregate_under(tree: &Tree, id: NodeId) -> Progress {
    count(tree, tree.descendants(id))
}

fn count(tree: &Tree, ids: Vec<NodeId>) -> Progress {
    let total = ids.len();
    let completed = ids
        .iter()
        .filter_map(|id| tree.node(*id))
        .filter(|n| n.completed())
        .count();
    Progress::from_counts(total, completed)
}

fn percent_of(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    // round(100 * c / t) with halves going up, in integers
    ((completed * 200 + total) / (total * 2)) as u8
}

/// Memoizes [`aggregate`] for one tree, keyed on its version counter.
///
/// Reset it whenever the tree it tracks is replaced wholesale, since a
/// freshly decoded tree starts again at version 0.
#[derive(Debug, Clone, Default)]
pub struct ProgressCache {
    cached: Option<(u64, Progress)>,
}

impl ProgressCache {
    pub fn get(&mut self, tree: &Tree) -> Progress {
        match self.cached {
            Some((version, progress)) if version == tree.version() => progress,
            _ => {
                let progress = aggregate(tree);
                self.cached = Some((tree.version(), progress));
                progress
            }
        }
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::path::TreePath;
    use crate::ops::tree_ops::{add_child, set_completed};
    use pretty_assertions::assert_eq;

    fn path(segments: &[usize]) -> TreePath {
        TreePath::from(segments)
    }

    #[test]
    fn test_empty_tree() {
        assert_eq!(
            aggregate(&Tree::new()),
            Progress {
                total: 0,
                completed: 0,
                percent: 0
            }
        );
        assert!(!Progress::default().is_complete());
    }

    #[test]
    fn test_counts_every_depth() {
        let mut tree = Tree::new();
        add_child(&mut tree, &TreePath::root(), "a").unwrap();
        add_child(&mut tree, &path(&[0]), "b").unwrap();
        add_child(&mut tree, &path(&[0, 0]), "c").unwrap();
        add_child(&mut tree, &path(&[0, 0, 0]), "d").unwrap();
        set_completed(&mut tree, &path(&[0, 0, 0, 0]), true).unwrap();

        let p = aggregate(&tree);
        assert_eq!(p.total, 4);
        assert_eq!(p.completed, 1);
        assert_eq!(p.percent, 25);
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(percent_of(1, 3), 33);
        assert_eq!(percent_of(2, 3), 67);
        assert_eq!(percent_of(1, 8), 13);
        assert_eq!(percent_of(1, 200), 1);
        assert_eq!(percent_of(3, 3), 100);
        assert_eq!(percent_of(0, 7), 0);
    }

    #[test]
    fn test_aggregate_under() {
        let mut tree = Tree::new();
        add_child(&mut tree, &TreePath::root(), "parent").unwrap();
        add_child(&mut tree, &path(&[0]), "x").unwrap();
        add_child(&mut tree, &path(&[0]), "y").unwrap();
        set_completed(&mut tree, &path(&[0]), true).unwrap();
        set_completed(&mut tree, &path(&[0, 1]), true).unwrap();

        let parent = tree.roots()[0];
        assert_eq!(
            aggregate_under(&tree, parent),
            Progress {
                total: 2,
                completed: 1,
                percent: 50
            }
        );
    }

    #[test]
    fn test_cache_follows_version() {
        let mut tree = Tree::new();
        add_child(&mut tree, &TreePath::root(), "a").unwrap();
        let mut cache = ProgressCache::default();
        assert_eq!(cache.get(&tree).completed, 0);

        set_completed(&mut tree, &path(&[0]), true).unwrap();
        assert_eq!(cache.get(&tree).completed, 1);
        assert!(cache.get(&tree).is_complete());
    }
}
