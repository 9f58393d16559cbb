use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};
use tracing::debug;

use super::progress::{ScanMessage, ScanProgress};
use crate::destination::destination_for;
use crate::tree::SizeTree;

/// Scanner configuration
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Follow symbolic links
    pub follow_symlinks: bool,
    /// Leave out entries that already exist as files below this root
    pub destination: Option<PathBuf>,
}

/// Filesystem scanner building a [`SizeTree`] in one pass
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Scan all paths below an unnamed root
    pub fn scan(&self, paths: &[PathBuf]) -> SizeTree {
        self.scan_with(paths, |_| {})
    }

    /// Scan all paths below an unnamed root, reporting every counted entry.
    ///
    /// Throttling the observer is up to the caller.
    pub fn scan_with<F>(&self, paths: &[PathBuf], mut observer: F) -> SizeTree
    where
        F: FnMut(ScanMessage),
    {
        let mut progress = ScanProgress::default();
        let mut children = Vec::with_capacity(paths.len());

        for path in paths {
            if self.destination_exists(path) {
                progress.skipped += 1;
                observer(ScanMessage::Skipped(path.clone()));
                continue;
            }
            children.push(self.scan_entry(path, &mut progress, &mut observer));
        }

        let tree = SizeTree::directory(PathBuf::new(), children);
        observer(ScanMessage::Completed {
            total: tree.counter,
            errors: progress.errors,
        });
        tree
    }

    /// Scan a single path
    fn scan_entry<F>(&self, path: &Path, progress: &mut ScanProgress, observer: &mut F) -> SizeTree
    where
        F: FnMut(ScanMessage),
    {
        let metadata = match self.stat(path) {
            Ok(m) => m,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "scan: entry not found");
                return SizeTree::missing(path.to_path_buf());
            }
        };

        if metadata.is_dir() {
            return self.scan_directory(path, progress, observer);
        }

        let leaf = if metadata.is_file() {
            progress.files_scanned += 1;
            progress.bytes_scanned += metadata.len();
            SizeTree::file(path.to_path_buf(), metadata.len())
        } else {
            SizeTree::special(path.to_path_buf())
        };
        progress.current_path = Some(path.to_path_buf());
        observer(ScanMessage::Progress(progress.clone()));
        leaf
    }

    /// Walk a directory serially in sorted order and fold the flat pre-order
    /// stream back into a nested tree.
    fn scan_directory<F>(
        &self,
        root: &Path,
        progress: &mut ScanProgress,
        observer: &mut F,
    ) -> SizeTree
    where
        F: FnMut(ScanMessage),
    {
        let walker = WalkDir::new(root)
            .skip_hidden(false)
            .follow_links(self.config.follow_symlinks)
            .sort(true)
            .parallelism(Parallelism::Serial);

        // Open directories, outermost first. After folding, its length equals
        // the depth of the entry being added.
        let mut stack: Vec<(PathBuf, Vec<SizeTree>)> = Vec::new();
        // Depth of a skipped directory whose descendants are ignored
        let mut skip_depth: Option<usize> = None;

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(e) => {
                    // Unlistable directories stay in the tree without children
                    progress.errors += 1;
                    debug!(error = %e, "scan: unreadable entry");
                    continue;
                }
            };

            let depth = entry.depth;
            if let Some(skipped) = skip_depth {
                if depth > skipped {
                    continue;
                }
                skip_depth = None;
            }

            while stack.len() > depth.max(1) {
                fold_top(&mut stack);
            }

            let path = entry.path();
            let file_type = entry.file_type();

            if depth > 0 && self.destination_exists(&path) {
                progress.skipped += 1;
                observer(ScanMessage::Skipped(path));
                if file_type.is_dir() {
                    skip_depth = Some(depth);
                }
                continue;
            }

            if file_type.is_dir() {
                progress.dirs_scanned += 1;
                stack.push((path.clone(), Vec::new()));
            } else {
                let leaf = if file_type.is_file() {
                    match entry.metadata() {
                        Ok(metadata) => {
                            progress.files_scanned += 1;
                            progress.bytes_scanned += metadata.len();
                            SizeTree::file(path.clone(), metadata.len())
                        }
                        Err(e) => {
                            progress.errors += 1;
                            debug!(path = %path.display(), error = %e, "scan: cannot stat file");
                            SizeTree::missing(path.clone())
                        }
                    }
                } else {
                    SizeTree::special(path.clone())
                };

                match stack.last_mut() {
                    Some((_, children)) => children.push(leaf),
                    // The root itself turned out not to be a directory
                    None => return leaf,
                }
            }

            progress.current_path = Some(path);
            observer(ScanMessage::Progress(progress.clone()));
        }

        while stack.len() > 1 {
            fold_top(&mut stack);
        }

        match stack.pop() {
            Some((path, children)) => SizeTree::directory(path, children),
            None => SizeTree::missing(root.to_path_buf()),
        }
    }

    fn stat(&self, path: &Path) -> std::io::Result<Metadata> {
        if self.config.follow_symlinks {
            fs::metadata(path)
        } else {
            fs::symlink_metadata(path)
        }
    }

    fn destination_exists(&self, source: &Path) -> bool {
        self.config
            .destination
            .as_deref()
            .is_some_and(|root| destination_for(root, source).is_file())
    }
}

/// Close the innermost open directory and attach it to its parent
fn fold_top(stack: &mut Vec<(PathBuf, Vec<SizeTree>)>) {
    if stack.len() < 2 {
        return;
    }
    if let Some((path, children)) = stack.pop()
        && let Some((_, parent_children)) = stack.last_mut()
    {
        parent_children.push(SizeTree::directory(path, children));
    }
}

/// Scan `paths` into a tree, optionally leaving out entries whose destination
/// below `destination` already exists as a file.
pub fn scan(paths: &[PathBuf], follow_symlinks: bool, destination: Option<&Path>) -> SizeTree {
    Scanner::new(ScanConfig {
        follow_symlinks,
        destination: destination.map(Path::to_path_buf),
    })
    .scan(paths)
}
