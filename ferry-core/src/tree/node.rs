use std::fmt;
use std::path::{Path, PathBuf};

use super::counter::Counter;

/// Type of a scanned entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Directory with its entries in lexicographic order
    Directory(Vec<SizeTree>),
    /// Regular file
    File,
    /// Device, fifo, socket or (when not following links) symlink
    Special,
    /// Path that could not be stat'ed during the scan
    Missing,
}

/// Immutable size description of a source tree, built once by the scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeTree {
    pub counter: Counter,
    pub path: PathBuf,
    pub kind: NodeKind,
}

impl SizeTree {
    /// Create a directory node whose counter is the sum of its children
    pub fn directory(path: PathBuf, children: Vec<SizeTree>) -> Self {
        let counter = children.iter().map(|c| c.counter).sum();
        Self {
            counter,
            path,
            kind: NodeKind::Directory(children),
        }
    }

    pub fn file(path: PathBuf, bytes: u64) -> Self {
        Self {
            counter: Counter::file(bytes),
            path,
            kind: NodeKind::File,
        }
    }

    pub fn special(path: PathBuf) -> Self {
        Self {
            counter: Counter::ZERO,
            path,
            kind: NodeKind::Special,
        }
    }

    pub fn missing(path: PathBuf) -> Self {
        Self {
            counter: Counter::ZERO,
            path,
            kind: NodeKind::Missing,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Children of a directory, `None` for leaves
    pub fn children(&self) -> Option<&[SizeTree]> {
        match &self.kind {
            NodeKind::Directory(children) => Some(children),
            _ => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children().is_none()
    }

    /// Total number of nodes including this one
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .map(|children| children.iter().map(SizeTree::node_count).sum())
            .unwrap_or(0)
    }

    /// Check that every directory counter equals the sum of its children
    pub fn is_consistent(&self) -> bool {
        match self.children() {
            None => true,
            Some(children) => {
                let sum: Counter = children.iter().map(|c| c.counter).sum();
                sum == self.counter && children.iter().all(SizeTree::is_consistent)
            }
        }
    }

    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self.children() {
            Some(children) => {
                write!(f, "{}{} {}/", indent, self.counter, self.path.display())?;
                for child in children {
                    writeln!(f)?;
                    child.fmt_indented(f, depth + 1)?;
                }
                Ok(())
            }
            None => write!(f, "{}{} {}", indent, self.counter, self.path.display()),
        }
    }
}

/// Indented `files bytes path` listing, directories marked with a trailing slash
impl fmt::Display for SizeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> SizeTree {
        SizeTree::directory(
            PathBuf::new(),
            vec![
                SizeTree::directory(
                    PathBuf::from("a"),
                    vec![
                        SizeTree::file(PathBuf::from("a/f1"), 10),
                        SizeTree::file(PathBuf::from("a/f2"), 0),
                    ],
                ),
                SizeTree::directory(PathBuf::from("b"), Vec::new()),
            ],
        )
    }

    #[test]
    fn test_directory_sums_children() {
        let tree = sample_tree();
        assert_eq!(tree.counter, Counter::new(2, 10));
        assert!(tree.is_consistent());
        assert_eq!(tree.node_count(), 5);
    }

    #[test]
    fn test_leaf_kinds() {
        assert!(SizeTree::special(PathBuf::from("dev")).is_leaf());
        assert_eq!(SizeTree::missing(PathBuf::from("gone")).counter, Counter::ZERO);
        assert_eq!(SizeTree::directory(PathBuf::from("d"), Vec::new()).children(), Some(&[][..]));
    }

    #[test]
    fn test_display_listing() {
        let listing = sample_tree().to_string();
        assert_eq!(
            listing,
            "2 10 /\n  2 10 a/\n    1 10 a/f1\n    1 0 a/f2\n  0 0 b/"
        );
    }
}
