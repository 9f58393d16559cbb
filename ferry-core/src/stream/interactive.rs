use std::io;
use std::os::fd::RawFd;
use std::time::{Duration, Instant};

use tracing::debug;

use super::keys::{KeySource, Keystroke, read_keystroke};
use super::reader::StreamReader;
use super::ready::wait_ready;
use super::Event;

/// Interleaves stream events with keystrokes on a single thread.
///
/// While a file is being drained, the controller waits for either the file or
/// the keyboard to become readable and serves whichever is ready, keyboard
/// first. Between files the reader is pulled directly. An artificial delay,
/// when set, is inserted after every stream event; keystrokes are still
/// served while it runs.
pub struct InteractiveController<'t, K> {
    reader: StreamReader<'t>,
    keys: K,
    keys_open: bool,
    file_fd: Option<RawFd>,
    delay: Option<Duration>,
    resume_at: Option<Instant>,
}

impl<'t, K: KeySource> InteractiveController<'t, K> {
    pub fn new(reader: StreamReader<'t>, keys: K) -> Self {
        let keys_open = keys.raw_fd().is_some();
        Self {
            reader,
            keys,
            keys_open,
            file_fd: None,
            delay: None,
            resume_at: None,
        }
    }

    /// Bytes of the most recent `DataChunk`
    pub fn chunk(&self) -> &[u8] {
        self.reader.chunk()
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    /// Pause after each stream event; `None` disables the pause
    pub fn set_delay(&mut self, delay: Option<Duration>) {
        self.delay = delay.filter(|d| !d.is_zero());
        if self.delay.is_none() {
            self.resume_at = None;
        }
    }

    /// Block until the next keystroke. Returns `None` once the key source is
    /// exhausted or when there is none.
    pub fn wait_key(&mut self) -> io::Result<Option<Keystroke>> {
        if !self.keys_open {
            return Ok(None);
        }
        self.read_key()
    }

    fn key_fd(&self) -> Option<RawFd> {
        if self.keys_open { self.keys.raw_fd() } else { None }
    }

    fn read_key(&mut self) -> io::Result<Option<Keystroke>> {
        let stroke = read_keystroke(&mut self.keys)?;
        if stroke.is_none() {
            debug!("keys: input closed");
            self.keys_open = false;
        }
        Ok(stroke)
    }

    /// Serve keys until the pending delay has passed
    fn wait_delay(&mut self) -> io::Result<Option<Keystroke>> {
        while let Some(resume_at) = self.resume_at {
            let now = Instant::now();
            if now >= resume_at {
                self.resume_at = None;
                break;
            }
            match self.key_fd() {
                Some(fd) => {
                    if wait_ready(None, Some(fd), Some(resume_at - now))?.keys
                        && let Some(stroke) = self.read_key()?
                    {
                        return Ok(Some(stroke));
                    }
                }
                None => std::thread::sleep(resume_at - now),
            }
        }
        Ok(None)
    }

    fn pull(&mut self) -> Option<Event> {
        let event = self.reader.next()?;
        self.file_fd = match &event {
            Event::FileOpened { handle, .. } | Event::DataChunk { handle, .. } => {
                Some(handle.raw_fd())
            }
            _ => None,
        };
        self.resume_at = self.delay.map(|delay| Instant::now() + delay);
        Some(event)
    }

    fn next_event(&mut self) -> io::Result<Option<Event>> {
        loop {
            if let Some(stroke) = self.wait_delay()? {
                return Ok(Some(Event::Keystroke(stroke)));
            }

            let (Some(file_fd), Some(key_fd)) = (self.file_fd, self.key_fd()) else {
                return Ok(self.pull());
            };

            let ready = wait_ready(Some(file_fd), Some(key_fd), None)?;
            if ready.keys {
                match self.read_key()? {
                    Some(stroke) => return Ok(Some(Event::Keystroke(stroke))),
                    None => continue,
                }
            }
            if ready.source {
                return Ok(self.pull());
            }
        }
    }
}

impl<K: KeySource> Iterator for InteractiveController<'_, K> {
    type Item = io::Result<Event>;

    fn next(&mut self) -> Option<io::Result<Event>> {
        self.next_event().transpose()
    }
}
