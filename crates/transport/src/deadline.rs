//! # Overview
//!
//! Negotiation is bounded by an absolute deadline on the raw connection. This
//! module defines the [`Deadline`] capability the negotiator requires and the
//! [`DeadlineStream`] adapter that provides it for ordinary sockets.
//!
//! # Design
//!
//! Standard library sockets only expose *relative* per-operation timeouts.
//! [`DeadlineStream`] stores the absolute instant and, before every read or
//! write, arms the socket with the time that remains. Once the instant has
//! passed, operations fail with [`io::ErrorKind::TimedOut`] without touching
//! the socket. Platforms that report an expired socket timeout as
//! [`io::ErrorKind::WouldBlock`] are normalised to `TimedOut` as well.
//!
//! # Invariants
//!
//! - Clearing the deadline (`set_deadline(None)`) also clears the socket's
//!   relative timeouts, so later operations block indefinitely again.
//! - No operation is attempted after the deadline has passed.

use std::io::{self, IoSlice, Read, Write};
use std::net::TcpStream;
#[cfg(unix)]
use std::os::unix::net::UnixStream;
use std::time::{Duration, Instant};

/// A connection that can bound its blocking I/O by an absolute instant.
///
/// `Some(instant)` arms the deadline: any pending or later read or write that
/// cannot complete before `instant` fails with [`io::ErrorKind::TimedOut`].
/// `None` restores unbounded blocking I/O.
pub trait Deadline {
    /// Arms or clears the deadline.
    fn set_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()>;
}

impl<T: Deadline + ?Sized> Deadline for &mut T {
    fn set_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        (**self).set_deadline(deadline)
    }
}

impl<T: Deadline + ?Sized> Deadline for Box<T> {
    fn set_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        (**self).set_deadline(deadline)
    }
}

/// Sockets exposing relative read and write timeouts.
pub trait SocketTimeouts {
    /// Sets the read timeout; `None` blocks indefinitely.
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Sets the write timeout; `None` blocks indefinitely.
    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;
}

impl SocketTimeouts for TcpStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        Self::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        Self::set_write_timeout(self, timeout)
    }
}

#[cfg(unix)]
impl SocketTimeouts for UnixStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        Self::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        Self::set_write_timeout(self, timeout)
    }
}

/// Socket adapter that turns relative timeouts into an absolute deadline.
///
/// # Examples
///
/// ```
/// use std::net::{TcpListener, TcpStream};
/// use std::time::{Duration, Instant};
/// use std::io::Read;
/// use transport::{Deadline, DeadlineStream};
///
/// let listener = TcpListener::bind("127.0.0.1:0").unwrap();
/// let socket = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
/// let _peer = listener.accept().unwrap();
///
/// let mut stream = DeadlineStream::new(socket);
/// stream.set_deadline(Some(Instant::now() + Duration::from_millis(20))).unwrap();
///
/// let mut buf = [0u8; 1];
/// let err = stream.read(&mut buf).unwrap_err();
/// assert_eq!(err.kind(), std::io::ErrorKind::TimedOut);
///
/// stream.set_deadline(None).unwrap();
/// assert_eq!(stream.deadline(), None);
/// ```
#[derive(Debug)]
pub struct DeadlineStream<S> {
    inner: S,
    deadline: Option<Instant>,
}

impl<S> DeadlineStream<S> {
    /// Wraps `inner` with no deadline armed.
    #[must_use]
    pub const fn new(inner: S) -> Self {
        Self {
            inner,
            deadline: None,
        }
    }

    /// Returns the armed deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns a shared reference to the wrapped socket.
    #[must_use]
    pub const fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Returns a mutable reference to the wrapped socket.
    ///
    /// Adjusting the socket's timeouts directly while a deadline is armed is
    /// harmless: they are re-armed before the next operation.
    #[must_use]
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Releases the wrapped socket.
    ///
    /// Any relative timeouts armed by the last operation remain set on the
    /// socket; clear the deadline first to reset them.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.inner
    }
}

fn timed_out() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "connection deadline exceeded")
}

impl<S: SocketTimeouts> DeadlineStream<S> {
    /// Returns the time left before the deadline, or `TimedOut` once it has passed.
    fn remaining(&self) -> io::Result<Option<Duration>> {
        match self.deadline {
            None => Ok(None),
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    Err(timed_out())
                } else {
                    Ok(Some(remaining))
                }
            }
        }
    }

    fn normalise(&self, err: io::Error) -> io::Error {
        if self.deadline.is_some() && err.kind() == io::ErrorKind::WouldBlock {
            timed_out()
        } else {
            err
        }
    }
}

impl<S: SocketTimeouts> Deadline for DeadlineStream<S> {
    fn set_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        if deadline.is_none() {
            self.inner.set_read_timeout(None)?;
            self.inner.set_write_timeout(None)?;
        }
        self.deadline = deadline;
        Ok(())
    }
}

impl<S: SocketTimeouts + Read> Read for DeadlineStream<S> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(remaining) = self.remaining()? {
            self.inner.set_read_timeout(Some(remaining))?;
        }
        self.inner.read(buf).map_err(|err| self.normalise(err))
    }
}

impl<S: SocketTimeouts + Write> Write for DeadlineStream<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(remaining) = self.remaining()? {
            self.inner.set_write_timeout(Some(remaining))?;
        }
        self.inner.write(buf).map_err(|err| self.normalise(err))
    }

    fn write_vectored(&mut self, bufs: &[IoSlice<'_>]) -> io::Result<usize> {
        if let Some(remaining) = self.remaining()? {
            self.inner.set_write_timeout(Some(remaining))?;
        }
        self.inner
            .write_vectored(bufs)
            .map_err(|err| self.normalise(err))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.remaining()?;
        self.inner.flush().map_err(|err| self.normalise(err))
    }
}
