#![deny(unsafe_code)]
#![deny(missing_docs)]

//! Shared test utilities for the protomux workspace.
//!
//! The main export is [`duplex`], an in-memory bidirectional byte pipe whose
//! ends behave like connected sockets: reads block until data arrives or the
//! peer closes, and both directions honour a [`transport::Deadline`]. Each end
//! counts the bytes it has moved so tests can assert exactly how much a
//! handshake exchanged.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use transport::Deadline;

#[derive(Default)]
struct Buffer {
    bytes: VecDeque<u8>,
    /// Writer side is gone; readers see end-of-stream once drained.
    write_closed: bool,
    /// Reader side is gone; writers fail with `BrokenPipe`.
    read_closed: bool,
}

/// One direction of the pipe.
#[derive(Default)]
struct Channel {
    buffer: Mutex<Buffer>,
    readable: Condvar,
}

impl Channel {
    fn lock(&self) -> MutexGuard<'_, Buffer> {
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn close_write(&self) {
        self.lock().write_closed = true;
        self.readable.notify_all();
    }

    fn close_read(&self) {
        self.lock().read_closed = true;
    }
}

fn timed_out() -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, "pipe deadline exceeded")
}

/// One end of an in-memory duplex pipe created by [`duplex`].
///
/// Dropping an end closes both directions from its side: the peer reads
/// end-of-stream after draining buffered bytes, and the peer's writes fail.
pub struct PipeEnd {
    incoming: Arc<Channel>,
    outgoing: Arc<Channel>,
    deadline: Option<Instant>,
    bytes_read: u64,
    bytes_written: u64,
}

/// Creates a connected pair of pipe ends.
///
/// # Examples
///
/// ```
/// use std::io::{Read, Write};
///
/// let (mut left, mut right) = test_support::duplex();
/// left.write_all(b"ping").unwrap();
/// drop(left);
///
/// let mut received = Vec::new();
/// right.read_to_end(&mut received).unwrap();
/// assert_eq!(received, b"ping");
/// assert_eq!(right.bytes_read(), 4);
/// ```
#[must_use]
pub fn duplex() -> (PipeEnd, PipeEnd) {
    let forward = Arc::new(Channel::default());
    let backward = Arc::new(Channel::default());
    let left = PipeEnd::new(Arc::clone(&backward), Arc::clone(&forward));
    let right = PipeEnd::new(forward, backward);
    (left, right)
}

impl PipeEnd {
    fn new(incoming: Arc<Channel>, outgoing: Arc<Channel>) -> Self {
        Self {
            incoming,
            outgoing,
            deadline: None,
            bytes_read: 0,
            bytes_written: 0,
        }
    }

    /// Total bytes this end has read.
    #[must_use]
    pub const fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Total bytes this end has written.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// The deadline currently armed, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Number of bytes written by the peer that this end has not read yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.incoming.lock().bytes.len()
    }

    /// Closes the writing direction; the peer reads end-of-stream once drained.
    pub fn shutdown_write(&mut self) {
        self.outgoing.close_write();
    }

    fn expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }
}

impl Read for PipeEnd {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut buffer = self.incoming.lock();
        loop {
            if !buffer.bytes.is_empty() {
                let count = buf.len().min(buffer.bytes.len());
                for (slot, byte) in buf.iter_mut().zip(buffer.bytes.drain(..count)) {
                    *slot = byte;
                }
                self.bytes_read += count as u64;
                return Ok(count);
            }
            if buffer.write_closed {
                return Ok(0);
            }
            buffer = match self.deadline {
                None => self
                    .incoming
                    .readable
                    .wait(buffer)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(timed_out());
                    }
                    self.incoming
                        .readable
                        .wait_timeout(buffer, remaining)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }
}

impl Write for PipeEnd {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.expired() {
            return Err(timed_out());
        }
        let mut buffer = self.outgoing.lock();
        if buffer.read_closed || buffer.write_closed {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
        }
        buffer.bytes.extend(buf);
        drop(buffer);
        self.outgoing.readable.notify_all();
        self.bytes_written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.expired() {
            return Err(timed_out());
        }
        Ok(())
    }
}

impl Deadline for PipeEnd {
    fn set_deadline(&mut self, deadline: Option<Instant>) -> io::Result<()> {
        self.deadline = deadline;
        Ok(())
    }
}

impl Drop for PipeEnd {
    fn drop(&mut self) {
        self.outgoing.close_write();
        self.incoming.close_read();
    }
}

impl std::fmt::Debug for PipeEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeEnd")
            .field("deadline", &self.deadline)
            .field("bytes_read", &self.bytes_read)
            .field("bytes_written", &self.bytes_written)
            .finish_non_exhaustive()
    }
}
