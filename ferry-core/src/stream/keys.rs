use std::fmt;
use std::fs::File;
use std::io::{self, ErrorKind, Read};
use std::os::fd::{AsRawFd, RawFd};

const ESC: u8 = 0x1b;

/// Byte source for interactive commands
pub trait KeySource {
    /// Descriptor to wait on, `None` when there is nothing to wait for
    fn raw_fd(&self) -> Option<RawFd>;

    /// Read one byte, blocking; `None` at end of input
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

impl<K: KeySource + ?Sized> KeySource for Box<K> {
    fn raw_fd(&self) -> Option<RawFd> {
        (**self).raw_fd()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        (**self).read_byte()
    }
}

/// Key source for unattended runs
#[derive(Debug, Default, Clone, Copy)]
pub struct NoKeys;

impl KeySource for NoKeys {
    fn raw_fd(&self) -> Option<RawFd> {
        None
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        Ok(None)
    }
}

/// Reads raw key bytes from a terminal (or anything pollable)
#[derive(Debug)]
pub struct Keyboard<R> {
    input: R,
}

impl<R: Read + AsRawFd> Keyboard<R> {
    pub fn new(input: R) -> Self {
        Self { input }
    }
}

impl Keyboard<File> {
    /// Controlling terminal of the process, independent of redirected stdin
    pub fn open_tty() -> io::Result<Self> {
        File::open("/dev/tty").map(Self::new)
    }
}

impl<R: Read + AsRawFd> KeySource for Keyboard<R> {
    fn raw_fd(&self) -> Option<RawFd> {
        Some(self.input.as_raw_fd())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut byte = [0u8; 1];
        loop {
            match self.input.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

/// Decoded meaning of a keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    /// Unrecognised escape sequence
    Other,
}

/// Raw bytes of one key press; escape sequences are kept whole
#[derive(Clone, PartialEq, Eq)]
pub struct Keystroke {
    bytes: Vec<u8>,
}

impl Keystroke {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn key(&self) -> Key {
        match self.bytes.as_slice() {
            [ESC, b'[', b'A'] | [ESC, b'O', b'A'] => Key::Up,
            [ESC, b'[', b'B'] | [ESC, b'O', b'B'] => Key::Down,
            [ESC, b'[', b'C'] | [ESC, b'O', b'C'] => Key::Right,
            [ESC, b'[', b'D'] | [ESC, b'O', b'D'] => Key::Left,
            [byte] => Key::Char(*byte as char),
            _ => Key::Other,
        }
    }
}

impl fmt::Debug for Keystroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.bytes))
    }
}

/// Read one keystroke. An escape byte starts a sequence that runs up to and
/// including the next letter.
pub fn read_keystroke<K: KeySource + ?Sized>(keys: &mut K) -> io::Result<Option<Keystroke>> {
    let Some(first) = keys.read_byte()? else {
        return Ok(None);
    };
    let mut bytes = vec![first];
    if first == ESC {
        while let Some(byte) = keys.read_byte()? {
            bytes.push(byte);
            if byte.is_ascii_alphabetic() {
                break;
            }
        }
    }
    Ok(Some(Keystroke::new(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::net::UnixStream;

    fn keyboard(input: &[u8]) -> Keyboard<UnixStream> {
        let (mut tx, rx) = UnixStream::pair().unwrap();
        tx.write_all(input).unwrap();
        drop(tx);
        Keyboard::new(rx)
    }

    #[test]
    fn test_reads_plain_keys_and_sequences() {
        let mut keys = keyboard(b"q\x1b[Ad\x1b[1;5C");
        let mut decoded = Vec::new();
        while let Some(stroke) = read_keystroke(&mut keys).unwrap() {
            decoded.push(stroke.key());
        }
        assert_eq!(
            decoded,
            vec![Key::Char('q'), Key::Up, Key::Char('d'), Key::Other]
        );
    }

    #[test]
    fn test_end_of_input() {
        let mut keys = keyboard(b"");
        assert!(read_keystroke(&mut keys).unwrap().is_none());
        assert!(read_keystroke(&mut NoKeys).unwrap().is_none());
        assert_eq!(NoKeys.raw_fd(), None);
    }

    #[test]
    fn test_debug_shows_escaped_text() {
        let stroke = Keystroke::new(vec![ESC, b'[', b'Z']);
        assert_eq!(format!("{stroke:?}"), "\"\\u{1b}[Z\"");
        assert_eq!(Keystroke::new(vec![3]).key(), Key::Char('\u{3}'));
    }
}
