//! Built-in line-echo transport used by `listen` and `dial`.
//!
//! Every protocol identifier passed with `-p` is registered with this
//! transport, so the negotiated identifier only changes how the session is
//! labelled. The accepting side echoes each line it receives until the peer
//! closes; the initiating side sends one line and reads the echo.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::time::{Duration, Instant};

use transport::{Deadline, Role, TransportError};

/// Longest line, newline included, that a session echoes.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Idle time a listening session allows between lines when none is given.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Reads one line of at most [`MAX_LINE_LEN`] bytes into `line`.
///
/// Returns `Ok(false)` at end of stream.
fn read_bounded_line<R: BufRead>(reader: &mut R, line: &mut Vec<u8>) -> io::Result<bool> {
    line.clear();
    let limit = MAX_LINE_LEN as u64;
    let read = reader.by_ref().take(limit).read_until(b'\n', line)?;
    if read == MAX_LINE_LEN && line.last() != Some(&b'\n') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line exceeds {MAX_LINE_LEN} bytes"),
        ));
    }
    Ok(read > 0)
}

/// A negotiated connection running the line-echo exchange.
#[derive(Debug)]
pub struct EchoSession<C> {
    protocol: String,
    role: Role,
    conn: C,
}

/// Returns a transport that wraps negotiated connections in an [`EchoSession`].
pub fn line_echo<C>(
    protocol: &str,
) -> impl Fn(C, Role) -> Result<EchoSession<C>, TransportError> + Send + Sync + 'static
where
    C: 'static,
{
    let protocol = protocol.to_owned();
    move |conn, role| {
        Ok(EchoSession {
            protocol: protocol.clone(),
            role,
            conn,
        })
    }
}

impl<C> EchoSession<C> {
    /// Identifier the peers agreed on.
    #[must_use]
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Side this session runs on.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Mutable access to the underlying connection.
    pub fn get_mut(&mut self) -> &mut C {
        &mut self.conn
    }

    /// Releases the underlying connection.
    #[must_use]
    pub fn into_inner(self) -> C {
        self.conn
    }
}

impl<C: Read + Write> EchoSession<C> {
    /// Echoes every line back to the peer until it closes the stream.
    ///
    /// Returns the number of lines echoed. A final line without a trailing
    /// newline is echoed as received.
    ///
    /// # Errors
    ///
    /// Fails with [`io::ErrorKind::InvalidData`] on a line longer than
    /// [`MAX_LINE_LEN`], and with any error the connection reports.
    pub fn serve(self) -> io::Result<u64> {
        self.echo_lines(|_| Ok(()))
    }

    fn echo_lines<F>(self, mut before_read: F) -> io::Result<u64>
    where
        F: FnMut(&mut C) -> io::Result<()>,
    {
        let mut reader = BufReader::new(self.conn);
        let mut line = Vec::new();
        let mut echoed = 0;
        loop {
            if reader.buffer().is_empty() {
                before_read(reader.get_mut())?;
            }
            if !read_bounded_line(&mut reader, &mut line)? {
                return Ok(echoed);
            }
            let conn = reader.get_mut();
            conn.write_all(&line)?;
            conn.flush()?;
            echoed += 1;
        }
    }

    /// Sends `message` as one line and returns the peer's reply line.
    ///
    /// The trailing newline is stripped from the reply. An empty string is
    /// returned when the peer closes without answering.
    pub fn exchange(&mut self, message: &str) -> io::Result<String> {
        let mut request = Vec::with_capacity(message.len() + 1);
        request.extend_from_slice(message.as_bytes());
        request.push(b'\n');
        self.conn.write_all(&request)?;
        self.conn.flush()?;

        let mut reply = Vec::new();
        read_bounded_line(&mut BufReader::new(&mut self.conn), &mut reply)?;
        if reply.last() == Some(&b'\n') {
            reply.pop();
        }
        String::from_utf8(reply).map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))
    }
}

impl<C: Read + Write + Deadline> EchoSession<C> {
    /// Like [`serve`](Self::serve), but gives up once the peer stays silent
    /// for `idle`.
    ///
    /// The deadline is re-armed before every read that has to wait on the
    /// peer. A zero `idle` disables it.
    ///
    /// # Errors
    ///
    /// Fails with [`io::ErrorKind::TimedOut`] when the peer goes idle, plus
    /// everything [`serve`](Self::serve) reports.
    pub fn serve_with_idle_timeout(self, idle: Duration) -> io::Result<u64> {
        if idle.is_zero() {
            return self.serve();
        }
        self.echo_lines(|conn| conn.set_deadline(Instant::now().checked_add(idle)))
    }
}
