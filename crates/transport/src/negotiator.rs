//! # Overview
//!
//! [`NegotiatingTransport`] owns a set of stream transports keyed by protocol
//! identifier. Given a raw connection and its [`Role`], it runs the
//! multistream-select handshake under a deadline and hands the connection to
//! whichever transport the peers agreed on.
//!
//! # Design
//!
//! Registration and negotiation both take `&self`; the registry sits behind a
//! reader-writer lock, and each negotiation snapshots what it needs before any
//! I/O so a slow peer never blocks registrations or other negotiations. A
//! single negotiator is typically shared across accept loops via
//! [`std::sync::Arc`].
//!
//! # Invariants
//!
//! - Nothing is read or written after the agreement token; the transport sees
//!   every byte the peer sent afterwards.
//! - An armed deadline is always cleared before the connection leaves the
//!   negotiator, whether negotiation succeeded or failed.
//! - The accepting side consults registry membership; the initiating side
//!   proposes in registration order.

use std::io::{Read, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use protocol::{negotiate_listener, select_one_of};

use crate::config::NegotiatorConfig;
use crate::deadline::Deadline;
use crate::error::{HandshakeFailure, NegotiationError};
use crate::registry::{Registry, SharedTransport, StreamTransport};
use crate::role::Role;
use crate::trace::{trace_agreed, trace_failed, trace_handoff, trace_started};

/// Multiplexer that selects a stream transport per connection by negotiation.
///
/// `C` is the raw connection type and `O` the connection type every
/// registered transport produces.
///
/// # Examples
///
/// ```
/// use std::net::{TcpListener, TcpStream};
/// use std::io::{BufRead, BufReader, Write};
/// use transport::{DeadlineStream, NegotiatingTransport, Role, TransportError};
///
/// type Conn = DeadlineStream<TcpStream>;
///
/// type Tagged = (&'static str, Conn);
///
/// fn tagged(
///     name: &'static str,
/// ) -> impl Fn(Conn, Role) -> Result<Tagged, TransportError> + Send + Sync {
///     move |conn, _role| Ok((name, conn))
/// }
///
/// let server: NegotiatingTransport<Conn, Tagged> = NegotiatingTransport::new();
/// server.add_transport("/echo/1.0.0", tagged("echo"));
/// server.add_transport("/chat/1.0.0", tagged("chat"));
///
/// let client: NegotiatingTransport<Conn, Tagged> = NegotiatingTransport::new();
/// client.add_transport("/chat/1.0.0", tagged("chat"));
///
/// let listener = TcpListener::bind("127.0.0.1:0").unwrap();
/// let addr = listener.local_addr().unwrap();
///
/// std::thread::scope(|scope| {
///     let accepted = scope.spawn(|| {
///         let (socket, _) = listener.accept().unwrap();
///         server.negotiate(DeadlineStream::new(socket), Role::Accepting).unwrap()
///     });
///
///     let socket = TcpStream::connect(addr).unwrap();
///     let (name, mut conn) = client
///         .negotiate(DeadlineStream::new(socket), Role::Initiating)
///         .unwrap();
///     assert_eq!(name, "chat");
///     conn.write_all(b"hello\n").unwrap();
///
///     let (name, conn) = accepted.join().unwrap();
///     assert_eq!(name, "chat");
///     let mut line = String::new();
///     BufReader::new(conn).read_line(&mut line).unwrap();
///     assert_eq!(line, "hello\n");
/// });
/// ```
pub struct NegotiatingTransport<C, O> {
    registry: Registry<C, O>,
    config: NegotiatorConfig,
}

impl<C, O> NegotiatingTransport<C, O> {
    /// Creates an empty negotiator with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(NegotiatorConfig::default())
    }

    /// Creates an empty negotiator with `config`.
    #[must_use]
    pub fn with_config(config: NegotiatorConfig) -> Self {
        Self {
            registry: Registry::new(),
            config,
        }
    }

    /// Returns the configuration negotiations run with.
    #[must_use]
    pub const fn config(&self) -> &NegotiatorConfig {
        &self.config
    }

    /// Returns the time budget for a single negotiation.
    #[must_use]
    pub const fn negotiate_timeout(&self) -> Duration {
        self.config.negotiate_timeout()
    }

    /// Registers `transport` under `protocol`.
    ///
    /// Registering an identifier again replaces its transport. Whether the
    /// identifier is also proposed again depends on the configured
    /// [`PreferencePolicy`](crate::PreferencePolicy).
    pub fn add_transport<T>(&self, protocol: impl Into<String>, transport: T)
    where
        T: StreamTransport<C, Output = O> + 'static,
    {
        self.add_shared_transport(protocol, Arc::new(transport));
    }

    /// Registers an already shared transport under `protocol`.
    pub fn add_shared_transport(
        &self,
        protocol: impl Into<String>,
        transport: SharedTransport<C, O>,
    ) {
        self.registry
            .register(protocol.into(), transport, self.config.preference_policy());
    }

    /// Returns the transport currently registered under `protocol`.
    #[must_use]
    pub fn transport(&self, protocol: &str) -> Option<SharedTransport<C, O>> {
        self.registry.get(protocol)
    }

    /// Returns the identifiers accepted when answering, in first-registration order.
    #[must_use]
    pub fn protocols(&self) -> Vec<String> {
        self.registry.supported()
    }

    /// Returns the identifiers proposed when initiating, in proposal order.
    #[must_use]
    pub fn preferences(&self) -> Vec<String> {
        self.registry.preferences()
    }

    /// Returns the number of distinct registered identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Reports whether no transport is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<C, O> Default for NegotiatingTransport<C, O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, O> NegotiatingTransport<C, O>
where
    C: Read + Write + Deadline,
{
    /// Negotiates a protocol on `conn` and hands it to the matching transport.
    ///
    /// # Errors
    ///
    /// Returns a [`HandshakeFailure`] carrying the [`NegotiationError`]. The
    /// connection is returned inside it for every failure except
    /// [`NegotiationError::Transport`], where the transport already owned it.
    pub fn negotiate(&self, mut conn: C, role: Role) -> Result<O, HandshakeFailure<C>> {
        match self.select_protocol(&mut conn, role) {
            Ok(protocol) => self.hand_off(conn, role, protocol),
            Err(error) => Err(HandshakeFailure::new(error, Some(conn))),
        }
    }

    /// Passes `conn` to the transport registered under the agreed `protocol`.
    fn hand_off(&self, conn: C, role: Role, protocol: String) -> Result<O, HandshakeFailure<C>> {
        let Some(transport) = self.registry.get(&protocol) else {
            let error = NegotiationError::Unregistered { role, protocol };
            trace_failed(role, &error);
            return Err(HandshakeFailure::new(error, Some(conn)));
        };

        trace_handoff(role, &protocol);
        transport.new_conn(conn, role).map_err(|source| {
            let error = NegotiationError::Transport {
                role,
                protocol,
                source,
            };
            trace_failed(role, &error);
            HandshakeFailure::new(error, None)
        })
    }

    /// Runs only the handshake on `conn` and returns the agreed identifier.
    ///
    /// The deadline is armed and cleared exactly as in
    /// [`negotiate`](Self::negotiate), but the connection stays with the
    /// caller and no transport is invoked.
    ///
    /// # Errors
    ///
    /// - [`NegotiationError::NothingRegistered`] when the registry is empty.
    /// - [`NegotiationError::DeadlineSetup`] when the deadline cannot be armed;
    ///   no handshake bytes have been exchanged in that case.
    /// - [`NegotiationError::TimedOut`], [`NegotiationError::NoAgreement`] or
    ///   [`NegotiationError::Handshake`] when the handshake fails.
    /// - [`NegotiationError::DeadlineClear`] when the deadline cannot be
    ///   cleared afterwards; any earlier handshake failure is kept inside.
    pub fn select_protocol(&self, conn: &mut C, role: Role) -> Result<String, NegotiationError> {
        let candidates = match role {
            Role::Accepting => self.registry.supported(),
            Role::Initiating => self.registry.preferences(),
        };
        if candidates.is_empty() {
            let error = NegotiationError::NothingRegistered { role };
            trace_failed(role, &error);
            return Err(error);
        }

        let timeout = self.config.negotiate_timeout();
        let started = Instant::now();
        let deadline = if self.config.deadline_enabled() {
            started.checked_add(timeout)
        } else {
            None
        };
        trace_started(role, &candidates, timeout);

        if let Some(instant) = deadline {
            conn.set_deadline(Some(instant)).map_err(|source| {
                let error = NegotiationError::DeadlineSetup {
                    role,
                    timeout,
                    source,
                };
                trace_failed(role, &error);
                error
            })?;
        }

        let outcome = match role {
            Role::Accepting => negotiate_listener(&candidates, conn),
            Role::Initiating => select_one_of(&candidates, conn),
        }
        .map_err(|err| NegotiationError::from_select(err, role, timeout));

        let outcome = if deadline.is_some() {
            match conn.set_deadline(None) {
                Ok(()) => outcome,
                Err(source) => Err(NegotiationError::DeadlineClear {
                    role,
                    source,
                    earlier: outcome.err().map(Box::new),
                }),
            }
        } else {
            outcome
        };

        match &outcome {
            Ok(protocol) => trace_agreed(role, protocol, started.elapsed()),
            Err(error) => trace_failed(role, error),
        }
        outcome
    }
}
