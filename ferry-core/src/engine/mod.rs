//! Consumers of the event stream: copying and reading

mod control;
mod copy;
mod metadata;
mod read;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::progress::LevelView;
use crate::tree::Counter;

pub use control::{Command, Control, Flow};
pub use copy::{CopyEngine, copy};
pub use read::{TreeReader, read_tree};

/// One throttled snapshot of the live display
#[derive(Debug)]
pub struct ProgressFrame<'a> {
    /// Entry the event was about
    pub path: &'a Path,
    /// One view per level below the root, outermost first
    pub levels: &'a [LevelView],
    /// Transient status message, empty when expired
    pub message: &'a str,
    /// Selected level, index into `levels`
    pub cursor: usize,
}

/// Sink for live progress frames
pub trait Reporter {
    fn report(&mut self, frame: &ProgressFrame<'_>) -> io::Result<()>;

    /// The run is paused until the next key press
    fn paused(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Discards every frame
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&mut self, _frame: &ProgressFrame<'_>) -> io::Result<()> {
        Ok(())
    }
}

/// Non-fatal problem met while transferring one entry
#[derive(Debug, Error)]
pub enum WarningKind {
    #[error("could not create directory: {0}")]
    CreateDirectory(#[source] io::Error),

    #[error("could not create file: {0}")]
    CreateFile(#[source] io::Error),

    #[error("write failed, partial file left behind: {0}")]
    Write(#[source] io::Error),

    #[error("could not rename into place: {0}")]
    Rename(#[source] io::Error),

    #[error("could not stat source: {0}")]
    Stat(#[source] io::Error),

    #[error("could not chown to {uid}.{gid}: {error}")]
    Chown {
        uid: u32,
        gid: u32,
        #[source]
        error: io::Error,
    },

    #[error("could not chmod to {mode:o}: {error}")]
    Chmod {
        mode: u32,
        #[source]
        error: io::Error,
    },

    #[error("could not set times: {0}")]
    Times(#[source] io::Error),

    #[error("could not create symlink to {}: {error}", .target.display())]
    Symlink {
        target: PathBuf,
        #[source]
        error: io::Error,
    },

    #[error("cannot copy special files of this type")]
    Unsupported,

    #[error("bad leaf: {0}")]
    BadLeaf(#[source] io::Error),
}

/// A [`WarningKind`] together with the path it concerns
#[derive(Debug)]
pub struct Warning {
    pub path: PathBuf,
    pub kind: WarningKind,
}

impl Warning {
    pub fn new(path: impl Into<PathBuf>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.kind)
    }
}

/// Outcome of a copy run
#[derive(Debug, Default)]
pub struct CopyReport {
    /// Files written and renamed into place
    pub copied: Counter,
    /// Files left alone because their destination already existed
    pub skipped: Counter,
    pub warnings: Vec<Warning>,
    /// The user quit before the walk finished
    pub interrupted: bool,
}

impl CopyReport {
    pub fn total(&self) -> Counter {
        self.copied + self.skipped
    }
}

/// Outcome of a read run
#[derive(Debug, Default)]
pub struct ReadReport {
    /// Files read to the end
    pub read: Counter,
    pub warnings: Vec<Warning>,
    pub interrupted: bool,
}
