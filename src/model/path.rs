use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A route from the top-level list to one node, as zero-based child indices.
///
/// `[2, 0, 1]` is the third top-level node's first child's second child.
/// The empty path names the top-level list itself and is only meaningful as
/// an insertion target.
///
/// A path is only valid against the tree snapshot it was derived from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreePath(Vec<usize>);

impl TreePath {
    /// The top-level list
    pub fn root() -> Self {
        TreePath(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[usize] {
        &self.0
    }

    /// Level of the node this path names (0 for the top-level list)
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Path of the `index`-th child of the node this path names
    pub fn child(&self, index: usize) -> TreePath {
        let mut segments = self.0.clone();
        segments.push(index);
        TreePath(segments)
    }

    /// Split into the parent's path and this node's index among its siblings
    pub fn split_last(&self) -> Option<(TreePath, usize)> {
        let (last, rest) = self.0.split_last()?;
        Some((TreePath(rest.to_vec()), *last))
    }
}

impl From<Vec<usize>> for TreePath {
    fn from(segments: Vec<usize>) -> Self {
        TreePath(segments)
    }
}

impl From<&[usize]> for TreePath {
    fn from(segments: &[usize]) -> Self {
        TreePath(segments.to_vec())
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, ".");
        }
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid path '{0}': expected dot-separated indices like 2.0.1, or '.' for the top level")]
pub struct PathParseError(String);

impl FromStr for TreePath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "." {
            return Ok(TreePath::root());
        }
        s.split('.')
            .map(|part| part.trim().parse::<usize>())
            .collect::<Result<Vec<_>, _>>()
            .map(TreePath)
            .map_err(|_| PathParseError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path: TreePath = "2.0.1".parse().unwrap();
        assert_eq!(path.segments(), &[2, 0, 1]);
        assert_eq!(path.to_string(), "2.0.1");
        assert_eq!(path.depth(), 3);
    }

    #[test]
    fn test_root_forms() {
        assert!("".parse::<TreePath>().unwrap().is_root());
        assert!(".".parse::<TreePath>().unwrap().is_root());
        assert_eq!(TreePath::root().to_string(), ".");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("1..2".parse::<TreePath>().is_err());
        assert!("a.b".parse::<TreePath>().is_err());
        assert!("-1".parse::<TreePath>().is_err());
    }

    #[test]
    fn test_child_and_split_last() {
        let path = TreePath::from(vec![1, 3]);
        assert_eq!(path.child(0), TreePath::from(vec![1, 3, 0]));
        assert_eq!(path.split_last(), Some((TreePath::from(vec![1]), 3)));
        assert_eq!(TreePath::root().split_last(), None);
    }
}
