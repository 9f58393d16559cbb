use std::path::PathBuf;

use crate::tree::Counter;

/// Progress update during scanning
#[derive(Debug, Clone)]
pub enum ScanMessage {
    /// An entry was counted
    Progress(ScanProgress),
    /// An entry was left out because its destination already exists
    Skipped(PathBuf),
    /// Scan completed with the given total
    Completed {
        total: Counter,
        /// Entries that could not be listed or stat'ed
        errors: u64,
    },
}

/// Scanning progress statistics
#[derive(Debug, Clone, Default)]
pub struct ScanProgress {
    /// Number of files scanned
    pub files_scanned: u64,
    /// Number of directories scanned
    pub dirs_scanned: u64,
    /// Total bytes scanned so far
    pub bytes_scanned: u64,
    /// Number of entries that could not be read
    pub errors: u64,
    /// Number of entries skipped because their destination exists
    pub skipped: u64,
    /// Entry most recently counted
    pub current_path: Option<PathBuf>,
}

impl ScanProgress {
    /// Cumulative counter of everything scanned so far
    pub fn counter(&self) -> Counter {
        Counter::new(self.files_scanned, self.bytes_scanned)
    }
}
