//! Socket plumbing behind the `listen` and `dial` subcommands.

use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use transport::{Deadline, DeadlineStream, NegotiatingTransport, NegotiatorConfig, Role};

use crate::args::{DialArgs, ListenArgs};
use crate::echo::{EchoSession, line_echo};
use crate::error::CliError;

/// Tracing target for connection lifecycle events.
#[cfg(feature = "tracing")]
const CLI_TARGET: &str = "protomux::cli";

pub(crate) type Connection = DeadlineStream<TcpStream>;
pub(crate) type Negotiator = NegotiatingTransport<Connection, EchoSession<Connection>>;

/// Registers the line-echo transport under every identifier, in order.
pub(crate) fn build_negotiator(protocols: &[String], timeout: Duration) -> Negotiator {
    let negotiator =
        Negotiator::with_config(NegotiatorConfig::new().with_negotiate_timeout(timeout));
    for protocol in protocols {
        negotiator.add_transport(protocol.as_str(), line_echo::<Connection>(protocol));
    }
    negotiator
}

fn output(error: io::Error) -> CliError {
    CliError::io("write output", error)
}

/// Arms a deadline `timeout` from now; a zero timeout leaves the stream blocking.
fn arm(conn: &mut Connection, timeout: Duration) -> io::Result<()> {
    if timeout.is_zero() {
        return Ok(());
    }
    conn.set_deadline(Instant::now().checked_add(timeout))
}

fn connect(address: &str, timeout: Duration) -> Result<TcpStream, CliError> {
    let context = || format!("connect to {address}");
    if timeout.is_zero() {
        return TcpStream::connect(address).map_err(|error| CliError::io(context(), error));
    }

    let candidates = address
        .to_socket_addrs()
        .map_err(|error| CliError::io(format!("resolve {address}"), error))?;
    let mut last_error = None;
    for candidate in candidates {
        match TcpStream::connect_timeout(&candidate, timeout) {
            Ok(stream) => return Ok(stream),
            Err(error) => last_error = Some(error),
        }
    }
    let error = last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing")
    });
    Err(CliError::io(context(), error))
}

/// Binds `args.address` and serves connections until told to stop.
pub(crate) fn listen<Out, Err>(
    args: &ListenArgs,
    timeout: Duration,
    stdout: &mut Out,
    stderr: &mut Err,
) -> Result<(), CliError>
where
    Out: Write,
    Err: Write,
{
    let listener = TcpListener::bind(&args.address)
        .map_err(|error| CliError::io(format!("bind {}", args.address), error))?;
    let local = listener
        .local_addr()
        .map_err(|error| CliError::io("query listening address", error))?;
    writeln!(stdout, "listening on {local}").map_err(output)?;
    stdout.flush().map_err(output)?;

    let negotiator = build_negotiator(&args.protocols, timeout);
    serve_connections(&listener, &negotiator, args.once, args.idle, stdout, stderr)
}

/// Accepts connections one at a time.
///
/// Per-connection failures are reported on `stderr` and the loop continues,
/// unless `once` is set, in which case the first connection's outcome is
/// returned. A session silent for `idle` is closed so the next peer can be
/// accepted.
pub(crate) fn serve_connections<Out, Err>(
    listener: &TcpListener,
    negotiator: &Negotiator,
    once: bool,
    idle: Duration,
    stdout: &mut Out,
    stderr: &mut Err,
) -> Result<(), CliError>
where
    Out: Write,
    Err: Write,
{
    loop {
        let outcome = listener
            .accept()
            .map_err(|error| CliError::io("accept connection", error))
            .and_then(|(stream, peer)| serve_one(negotiator, stream, peer, idle, stdout));

        match outcome {
            Ok(()) if once => return Ok(()),
            Ok(()) => {}
            Err(error) if once => return Err(error),
            Err(error) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(target: CLI_TARGET, %error, "connection failed");
                writeln!(stderr, "protomux: {error}").map_err(output)?;
            }
        }
    }
}

fn serve_one<Out: Write>(
    negotiator: &Negotiator,
    stream: TcpStream,
    peer: SocketAddr,
    idle: Duration,
    stdout: &mut Out,
) -> Result<(), CliError> {
    #[cfg(feature = "tracing")]
    tracing::debug!(target: CLI_TARGET, %peer, "accepted connection");

    let session = negotiator
        .negotiate(DeadlineStream::new(stream), Role::Accepting)
        .map_err(|failure| CliError::from(failure.into_error()))?;
    let protocol = session.protocol().to_owned();
    writeln!(stdout, "{peer} negotiated {protocol}").map_err(output)?;
    stdout.flush().map_err(output)?;

    let lines = session
        .serve_with_idle_timeout(idle)
        .map_err(|error| CliError::io(format!("echo session with {peer}"), error))?;
    writeln!(stdout, "{peer} closed after {lines} lines").map_err(output)?;
    stdout.flush().map_err(output)
}

/// Connects to `args.address` and runs the initiating side.
pub(crate) fn dial<Out: Write>(
    args: &DialArgs,
    timeout: Duration,
    stdout: &mut Out,
) -> Result<(), CliError> {
    let mut conn = DeadlineStream::new(connect(&args.address, timeout)?);

    if args.list {
        arm(&mut conn, timeout).map_err(|error| CliError::io("arm deadline", error))?;
        for id in protocol::list_protocols(&mut conn)? {
            writeln!(stdout, "{id}").map_err(output)?;
        }
        return Ok(());
    }

    let negotiator = build_negotiator(&args.protocols, timeout);
    let mut session = negotiator
        .negotiate(conn, Role::Initiating)
        .map_err(|failure| CliError::from(failure.into_error()))?;
    writeln!(stdout, "negotiated {}", session.protocol()).map_err(output)?;

    if let Some(message) = &args.message {
        arm(session.get_mut(), timeout).map_err(|error| CliError::io("arm deadline", error))?;
        let reply = session
            .exchange(message)
            .map_err(|error| CliError::io("exchange message", error))?;
        writeln!(stdout, "{reply}").map_err(output)?;
    }

    #[cfg(feature = "tracing")]
    tracing::debug!(target: CLI_TARGET, protocol = session.protocol(), "dial finished");
    Ok(())
}

#[cfg(test)]
mod tests;
