use std::rc::Rc;

use crate::config::SampleConfig;
use crate::progress::{Ancestry, now};
use crate::tree::{Counter, SizeTree};

use super::Event;

/// Position of a directory relative to its entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkOrder {
    /// Directory before its entries
    #[default]
    PreOrder,
    /// Directory after its entries
    PostOrder,
}

enum Step<'t> {
    Visit {
        node: &'t SizeTree,
        ancestry: Rc<Ancestry>,
    },
    Children {
        node: &'t SizeTree,
        ancestry: Rc<Ancestry>,
        /// Level shared by all entries of `node`, created with the first one
        level: Option<Rc<Ancestry>>,
        next: usize,
        /// Running sum of the preceding siblings' counters
        offset: Counter,
    },
}

/// Depth-first walk over a [`SizeTree`] yielding `Directory` and `Leaf`
/// events, each with the ancestry level describing its window.
pub struct TreeWalker<'t> {
    stack: Vec<Step<'t>>,
    order: WalkOrder,
}

impl<'t> TreeWalker<'t> {
    pub fn new(tree: &'t SizeTree, order: WalkOrder, samples: SampleConfig) -> Self {
        let root = Ancestry::root(tree.counter, tree.path.clone(), samples, now());
        Self {
            stack: vec![Step::Visit {
                node: tree,
                ancestry: root,
            }],
            order,
        }
    }
}

impl Iterator for TreeWalker<'_> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        while let Some(step) = self.stack.pop() {
            match step {
                Step::Visit { node, ancestry } => {
                    if node.is_leaf() {
                        return Some(Event::Leaf {
                            path: node.path.clone(),
                            ancestry,
                        });
                    }

                    let offset = ancestry.start();
                    self.stack.push(Step::Children {
                        node,
                        ancestry: Rc::clone(&ancestry),
                        level: None,
                        next: 0,
                        offset,
                    });
                    if self.order == WalkOrder::PreOrder {
                        return Some(Event::Directory {
                            path: node.path.clone(),
                            ancestry,
                        });
                    }
                }
                Step::Children {
                    node,
                    ancestry,
                    level,
                    next,
                    offset,
                } => {
                    let children = node.children().unwrap_or_default();
                    let Some(child) = children.get(next) else {
                        if self.order == WalkOrder::PostOrder {
                            return Some(Event::Directory {
                                path: node.path.clone(),
                                ancestry,
                            });
                        }
                        continue;
                    };

                    let end = offset + child.counter;
                    let level = match level {
                        Some(level) => {
                            level.set_window(offset, end, child.path.clone(), now());
                            level
                        }
                        None => Ancestry::child(&ancestry, offset, end, child.path.clone(), now()),
                    };

                    self.stack.push(Step::Children {
                        node,
                        ancestry,
                        level: Some(Rc::clone(&level)),
                        next: next + 1,
                        offset: end,
                    });
                    self.stack.push(Step::Visit {
                        node: child,
                        ancestry: level,
                    });
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn tree() -> SizeTree {
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
                SizeTree::file(PathBuf::from("c"), 5),
            ],
        )
    }

    fn paths(order: WalkOrder) -> Vec<(String, &'static str)> {
        let tree = tree();
        TreeWalker::new(&tree, order, SampleConfig::default())
            .map(|event| {
                let path = event.path().unwrap().display().to_string();
                (path, event.kind())
            })
            .collect()
    }

    #[test]
    fn test_pre_order_visits_every_node_once() {
        assert_eq!(
            paths(WalkOrder::PreOrder),
            vec![
                ("".to_string(), "directory"),
                ("a".to_string(), "directory"),
                ("a/f1".to_string(), "leaf"),
                ("a/f2".to_string(), "leaf"),
                ("b".to_string(), "directory"),
                ("c".to_string(), "leaf"),
            ]
        );
    }

    #[test]
    fn test_post_order_puts_directories_last() {
        assert_eq!(
            paths(WalkOrder::PostOrder),
            vec![
                ("a/f1".to_string(), "leaf"),
                ("a/f2".to_string(), "leaf"),
                ("a".to_string(), "directory"),
                ("b".to_string(), "directory"),
                ("c".to_string(), "leaf"),
                ("".to_string(), "directory"),
            ]
        );
    }

    #[test]
    fn test_windows_follow_sibling_prefix_sums() {
        let tree = tree();
        let windows: Vec<(String, u64, u64, usize)> =
            TreeWalker::new(&tree, WalkOrder::PreOrder, SampleConfig::default())
                .map(|event| {
                    let ancestry = event.ancestry().unwrap();
                    (
                        event.path().unwrap().display().to_string(),
                        ancestry.start().bytes,
                        ancestry.end().bytes,
                        ancestry.depth(),
                    )
                })
                .collect();

        assert_eq!(
            windows,
            vec![
                ("".to_string(), 0, 15, 1),
                ("a".to_string(), 0, 10, 2),
                ("a/f1".to_string(), 0, 10, 3),
                ("a/f2".to_string(), 10, 10, 3),
                ("b".to_string(), 10, 10, 2),
                ("c".to_string(), 10, 15, 2),
            ]
        );
    }

    #[test]
    fn test_single_leaf_tree() {
        let tree = SizeTree::file(PathBuf::from("only"), 3);
        let events: Vec<Event> =
            TreeWalker::new(&tree, WalkOrder::PreOrder, SampleConfig::default()).collect();
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::Leaf { path, .. } if path == &PathBuf::from("only")));
    }
}
