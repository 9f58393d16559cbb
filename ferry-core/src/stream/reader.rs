use std::fs::{self, File};
use std::io::{self, ErrorKind, Read};
use std::os::fd::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::debug;

use crate::config::TransferConfig;
use crate::progress::{Ancestry, now};
use crate::tree::{Counter, SizeTree};

use super::walker::{TreeWalker, WalkOrder};
use super::{Event, SourceHandle};

/// The one source file currently being drained
struct OpenFile {
    file: File,
    path: PathBuf,
    handle: SourceHandle,
    /// Level tracking the position inside the file
    level: Rc<Ancestry>,
    position: Counter,
}

/// Turns the walker's leaves into file events, reading each regular file in
/// chunks through one shared buffer.
///
/// Only one file is open at a time; it is drained completely before the walk
/// continues.
pub struct StreamReader<'t> {
    walker: TreeWalker<'t>,
    follow_symlinks: bool,
    buffer: Vec<u8>,
    filled: usize,
    current: Option<OpenFile>,
}

impl<'t> StreamReader<'t> {
    pub fn new(tree: &'t SizeTree, config: &TransferConfig) -> Self {
        Self {
            walker: TreeWalker::new(tree, WalkOrder::PreOrder, config.samples),
            follow_symlinks: config.follow_symlinks,
            buffer: vec![0; config.chunk_size.max(1)],
            filled: 0,
            current: None,
        }
    }

    /// Bytes of the most recent `DataChunk`
    pub fn chunk(&self) -> &[u8] {
        &self.buffer[..self.filled]
    }

    /// Descriptor of the file being drained, if any
    pub fn open_fd(&self) -> Option<RawFd> {
        self.current.as_ref().map(|open| open.file.as_raw_fd())
    }

    fn stat(&self, path: &Path) -> io::Result<fs::Metadata> {
        if self.follow_symlinks {
            fs::metadata(path)
        } else {
            fs::symlink_metadata(path)
        }
    }

    fn read_next(&mut self) -> Option<Event> {
        let open = self.current.as_mut()?;
        loop {
            match open.file.read(&mut self.buffer) {
                Ok(0) => {
                    self.filled = 0;
                    open.level.advance(open.position, now());
                    let open = self.current.take()?;
                    debug!(path = %open.path.display(), "stream: end of file");
                    return Some(Event::EndOfFile {
                        path: open.path,
                        ancestry: open.level,
                        handle: open.handle,
                    });
                }
                Ok(len) => {
                    self.filled = len;
                    open.position += Counter::data(len as u64);
                    open.level.advance(open.position, now());
                    return Some(Event::DataChunk {
                        path: open.path.clone(),
                        ancestry: Rc::clone(&open.level),
                        handle: open.handle,
                        len,
                    });
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(error) => {
                    self.filled = 0;
                    let open = self.current.take()?;
                    debug!(path = %open.path.display(), %error, "stream: read failed");
                    return Some(Event::BadLeaf {
                        path: open.path,
                        ancestry: open.level,
                        error,
                        file: Some(open.file),
                    });
                }
            }
        }
    }

    fn open_leaf(&mut self, path: PathBuf, ancestry: Rc<Ancestry>) -> Option<Event> {
        let metadata = match self.stat(&path) {
            Ok(m) => m,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "stream: leaf vanished, dropped");
                return None;
            }
        };

        if metadata.is_dir() {
            return Some(Event::BadLeaf {
                path,
                ancestry,
                error: io::Error::other("became a directory after the scan"),
                file: None,
            });
        }
        if !metadata.is_file() {
            return Some(Event::Special { path, ancestry });
        }

        let file = match File::open(&path) {
            Ok(f) => f,
            Err(error) => {
                debug!(path = %path.display(), %error, "stream: cannot open");
                return Some(Event::BadLeaf {
                    path,
                    ancestry,
                    error,
                    file: None,
                });
            }
        };

        let handle = SourceHandle::new(file.as_raw_fd());
        let position = ancestry.start();
        let level = Ancestry::child(&ancestry, position, ancestry.end(), PathBuf::new(), now());
        self.current = Some(OpenFile {
            file,
            path: path.clone(),
            handle,
            level,
            position,
        });
        Some(Event::FileOpened {
            path,
            ancestry,
            handle,
        })
    }
}

impl Iterator for StreamReader<'_> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        if self.current.is_some() {
            return self.read_next();
        }

        loop {
            match self.walker.next()? {
                Event::Leaf { path, ancestry } => {
                    if let Some(event) = self.open_leaf(path, ancestry) {
                        return Some(event);
                    }
                }
                other => return Some(other),
            }
        }
    }
}
