use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

/// Which of the watched descriptors can be read without blocking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ready {
    pub source: bool,
    pub keys: bool,
}

impl Ready {
    pub fn any(self) -> bool {
        self.source || self.keys
    }
}

/// Block until `source` or `keys` is readable, or `timeout` expires.
///
/// Absent descriptors are not watched. Hang-up and error conditions count as
/// readable so that the following read reports them.
pub fn wait_ready(
    source: Option<RawFd>,
    keys: Option<RawFd>,
    timeout: Option<Duration>,
) -> io::Result<Ready> {
    let mut fds = [
        libc::pollfd {
            fd: source.unwrap_or(-1),
            events: libc::POLLIN,
            revents: 0,
        },
        libc::pollfd {
            fd: keys.unwrap_or(-1),
            events: libc::POLLIN,
            revents: 0,
        },
    ];
    let timeout_ms = match timeout {
        Some(t) => t.as_millis().min(libc::c_int::MAX as u128) as libc::c_int,
        None => -1,
    };

    loop {
        // SAFETY: `fds` is a valid array of two pollfd structs for the whole call
        let result = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
        if result >= 0 {
            break;
        }
        let error = io::Error::last_os_error();
        if error.kind() != io::ErrorKind::Interrupted {
            return Err(error);
        }
    }

    let readable = |fd: &libc::pollfd| {
        fd.fd >= 0 && fd.revents & (libc::POLLIN | libc::POLLHUP | libc::POLLERR) != 0
    };
    Ok(Ready {
        source: readable(&fds[0]),
        keys: readable(&fds[1]),
    })
}
