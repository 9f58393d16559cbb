//! Lazy event pipeline: tree walk, file streaming and keyboard multiplexing

mod interactive;
mod keys;
mod reader;
mod ready;
mod walker;

use std::fs::File;
use std::io;
use std::os::fd::RawFd;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::progress::Ancestry;

pub use interactive::InteractiveController;
pub use keys::{Key, KeySource, Keyboard, Keystroke, NoKeys, read_keystroke};
pub use reader::StreamReader;
pub use ready::{Ready, wait_ready};
pub use walker::{TreeWalker, WalkOrder};

/// Identity of the source file a chunk was read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceHandle(RawFd);

impl SourceHandle {
    pub fn new(fd: RawFd) -> Self {
        Self(fd)
    }

    pub fn raw_fd(self) -> RawFd {
        self.0
    }
}

/// Everything a pipeline stage can hand downstream
#[derive(Debug)]
pub enum Event {
    /// A directory, before (pre-order) or after (post-order) its entries
    Directory { path: PathBuf, ancestry: Rc<Ancestry> },
    /// A leaf of the scanned tree, not yet inspected
    Leaf { path: PathBuf, ancestry: Rc<Ancestry> },
    /// A symlink, device, fifo or socket
    Special { path: PathBuf, ancestry: Rc<Ancestry> },
    FileOpened {
        path: PathBuf,
        ancestry: Rc<Ancestry>,
        handle: SourceHandle,
    },
    /// `len` bytes are available in the reader's shared buffer
    DataChunk {
        path: PathBuf,
        ancestry: Rc<Ancestry>,
        handle: SourceHandle,
        len: usize,
    },
    EndOfFile {
        path: PathBuf,
        ancestry: Rc<Ancestry>,
        handle: SourceHandle,
    },
    /// Opening or reading a leaf failed. A file that failed mid-stream is
    /// handed over instead of being closed.
    BadLeaf {
        path: PathBuf,
        ancestry: Rc<Ancestry>,
        error: io::Error,
        file: Option<File>,
    },
    Keystroke(Keystroke),
}

impl Event {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Event::Directory { path, .. }
            | Event::Leaf { path, .. }
            | Event::Special { path, .. }
            | Event::FileOpened { path, .. }
            | Event::DataChunk { path, .. }
            | Event::EndOfFile { path, .. }
            | Event::BadLeaf { path, .. } => Some(path),
            Event::Keystroke(_) => None,
        }
    }

    pub fn ancestry(&self) -> Option<&Rc<Ancestry>> {
        match self {
            Event::Directory { ancestry, .. }
            | Event::Leaf { ancestry, .. }
            | Event::Special { ancestry, .. }
            | Event::FileOpened { ancestry, .. }
            | Event::DataChunk { ancestry, .. }
            | Event::EndOfFile { ancestry, .. }
            | Event::BadLeaf { ancestry, .. } => Some(ancestry),
            Event::Keystroke(_) => None,
        }
    }

    /// Short name of the variant for logs and protocol errors
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Directory { .. } => "directory",
            Event::Leaf { .. } => "leaf",
            Event::Special { .. } => "special",
            Event::FileOpened { .. } => "file-opened",
            Event::DataChunk { .. } => "data-chunk",
            Event::EndOfFile { .. } => "end-of-file",
            Event::BadLeaf { .. } => "bad-leaf",
            Event::Keystroke(_) => "keystroke",
        }
    }
}
