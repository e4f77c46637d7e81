//! Pager subprocess plumbing: the stdin pipe wrapper, the process handle,
//! and the pager error taxonomy.
//!
//! The lifecycle itself (`start_pager`/`stop_pager`) lives on
//! [`IoStreams`](crate::IoStreams); this module owns the pieces it swaps
//! in and out of the output slot.

use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin};
use std::thread::JoinHandle;

use crate::iostreams::{SharedBuffer, Sink};

/// Failure to acquire the resources a pager needs.
///
/// Absence of configuration (no pager set, output not a terminal) is not
/// an error; `start_pager` simply leaves output untouched in those cases.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PagerError {
    /// The pager command line could not be parsed into words.
    #[error("could not parse pager command: {0}")]
    BadCommand(String),

    /// The pager executable was not found on `PATH`.
    #[error("could not resolve pager executable: {0}")]
    ExecutableNotFound(#[from] which::Error),

    /// The pager process failed to start.
    #[error("failed to start pager: {0}")]
    Spawn(#[source] io::Error),

    /// The spawned pager exposed no stdin pipe.
    #[error("pager process has no stdin pipe")]
    StdinUnavailable,
}

/// Payload carried inside an [`io::Error`] when a write hits a pager
/// whose process has already exited (the user quit before output
/// finished).
///
/// Callers that want to treat "user quit the pager" as benign check
/// [`ClosedPagerPipe::is_cause`] instead of aborting on the write error.
#[derive(Debug, thiserror::Error)]
#[error("pager closed the pipe before output finished")]
pub struct ClosedPagerPipe {
    #[source]
    source: io::Error,
}

impl ClosedPagerPipe {
    /// Whether `err` was caused by the pager quitting early.
    pub fn is_cause(err: &io::Error) -> bool {
        err.get_ref()
            .and_then(|inner| inner.downcast_ref::<Self>())
            .is_some()
    }
}

/// Write end of the pager's stdin pipe.
///
/// Dropping it closes the pipe, which is how the child learns its input
/// is finished. Broken-pipe write failures are re-wrapped so callers can
/// distinguish "pager exited" from genuine I/O faults.
#[derive(Debug)]
pub(crate) struct PagerPipe {
    inner: ChildStdin,
}

impl PagerPipe {
    pub(crate) fn new(inner: ChildStdin) -> Self {
        Self { inner }
    }
}

impl Write for PagerPipe {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf).map_err(wrap_closed_pipe)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush().map_err(wrap_closed_pipe)
    }
}

fn wrap_closed_pipe(err: io::Error) -> io::Error {
    if err.kind() == io::ErrorKind::BrokenPipe {
        io::Error::new(
            io::ErrorKind::BrokenPipe,
            ClosedPagerPipe { source: err },
        )
    } else {
        err
    }
}

/// A running pager and everything needed to tear it down: the child
/// handle to wait on, the output pump threads draining its stdout/stderr
/// into buffer-backed streams, and the sink to restore once it is gone.
pub(crate) struct PagerProcess {
    pub(crate) child: Child,
    pub(crate) pumps: Vec<JoinHandle<()>>,
    pub(crate) restore: Sink,
}

impl std::fmt::Debug for PagerProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagerProcess")
            .field("pid", &self.child.id())
            .field("pumps", &self.pumps.len())
            .finish_non_exhaustive()
    }
}

/// Copy a child output stream into a shared buffer until EOF.
///
/// Joined in `stop_pager` after the child exits, so every byte the pager
/// produced is in the buffer before control returns to the caller.
pub(crate) fn pump<R>(mut reader: R, mut target: SharedBuffer) -> JoinHandle<()>
where
    R: Read + Send + 'static,
{
    std::thread::spawn(move || {
        let _ = io::copy(&mut reader, &mut target);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_wrap_broken_pipe_errors() {
        let raw = io::Error::new(io::ErrorKind::BrokenPipe, "EPIPE");
        let wrapped = wrap_closed_pipe(raw);
        assert_eq!(wrapped.kind(), io::ErrorKind::BrokenPipe);
        assert!(ClosedPagerPipe::is_cause(&wrapped));
    }

    #[test]
    fn test_should_pass_other_errors_through() {
        let raw = io::Error::new(io::ErrorKind::PermissionDenied, "EACCES");
        let passed = wrap_closed_pipe(raw);
        assert_eq!(passed.kind(), io::ErrorKind::PermissionDenied);
        assert!(!ClosedPagerPipe::is_cause(&passed));
    }

    #[test]
    fn test_should_not_flag_plain_broken_pipe() {
        // Only pipes wrapped by the pager writer count as "pager quit".
        let raw = io::Error::new(io::ErrorKind::BrokenPipe, "EPIPE");
        assert!(!ClosedPagerPipe::is_cause(&raw));
    }

    #[test]
    fn test_should_display_pager_errors() {
        let err = PagerError::BadCommand("less '".to_string());
        assert!(err.to_string().contains("less '"));

        let err = PagerError::StdinUnavailable;
        assert_eq!(err.to_string(), "pager process has no stdin pipe");

        let err = PagerError::Spawn(io::Error::other("boom"));
        assert!(err.to_string().contains("boom"));
    }
}
