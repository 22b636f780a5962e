#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! # Overview
//!
//! `transport` classifies raw byte-stream connections by sub-protocol. A
//! [`NegotiatingTransport`] holds stream transports keyed by protocol
//! identifier; for each connection it runs a multistream-select handshake
//! under a deadline and hands the connection to the transport both peers
//! agreed on.
//!
//! # Design
//!
//! - [`NegotiatingTransport`] drives a negotiation: snapshot the
//!   registry, arm the deadline, run the dialer or listener half of the
//!   handshake from the `protocol` crate, clear the deadline, dispatch.
//! - [`StreamTransport`] is the seam to the rest of the program. Closures with
//!   a matching signature implement it directly.
//! - [`Deadline`] abstracts absolute I/O deadlines; [`DeadlineStream`]
//!   implements it over standard library sockets.
//!
//! # Invariants
//!
//! - The negotiator never reads past the agreement token, so data the peer
//!   sends right after agreeing reaches the selected transport intact.
//! - An armed deadline is cleared before the connection is returned or handed
//!   off.
//! - The raw connection is returned to the caller on every failure that
//!   happens before a transport takes ownership.
//!
//! # Errors
//!
//! [`NegotiatingTransport::negotiate`] reports failures as
//! [`HandshakeFailure`], which pairs a [`NegotiationError`] with the original
//! connection when it is still available.
//!
//! # Examples
//!
//! Run the handshake over an in-memory script and inspect what was sent.
//!
//! ```
//! use std::io::{self, Cursor, Read, Write};
//! use std::time::Instant;
//! use transport::{Deadline, NegotiatingTransport, Role, TransportError};
//!
//! struct Script {
//!     input: Cursor<Vec<u8>>,
//!     output: Vec<u8>,
//! }
//!
//! impl Read for Script {
//!     fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
//!         self.input.read(buf)
//!     }
//! }
//!
//! impl Write for Script {
//!     fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
//!         self.output.write(buf)
//!     }
//!     fn flush(&mut self) -> io::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! impl Deadline for Script {
//!     fn set_deadline(&mut self, _deadline: Option<Instant>) -> io::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let mut input = Vec::new();
//! for token in ["/multistream/1.0.0", "/echo/1.0.0"] {
//!     protocol::write_token(&mut input, token).unwrap();
//! }
//! let conn = Script { input: Cursor::new(input), output: Vec::new() };
//!
//! let negotiator: NegotiatingTransport<Script, (Script, Role)> = NegotiatingTransport::new();
//! negotiator.add_transport("/echo/1.0.0", |conn: Script, role: Role| -> Result<_, TransportError> {
//!     Ok((conn, role))
//! });
//!
//! let (conn, role) = negotiator.negotiate(conn, Role::Initiating).unwrap();
//! assert_eq!(role, Role::Initiating);
//! assert!(!conn.output.is_empty());
//! ```
//!
//! # See also
//!
//! - [`protocol`] for the wire codec and handshake algorithms.

mod config;
mod deadline;
mod error;
mod negotiator;
mod registry;
mod role;
mod trace;

pub use config::{DEFAULT_NEGOTIATE_TIMEOUT, NegotiatorConfig, PreferencePolicy};
pub use deadline::{Deadline, DeadlineStream, SocketTimeouts};
pub use error::{HandshakeFailure, NegotiationError};
pub use negotiator::NegotiatingTransport;
pub use registry::{SharedTransport, StreamTransport, TransportError};
pub use role::Role;
