//! # Overview
//!
//! The two halves of the multistream-select handshake. A *dialer* proposes
//! identifiers in preference order until one is echoed back; a *listener*
//! answers each proposal with an echo (accept) or `na` (reject).
//!
//! # Design
//!
//! Both halves are plain functions over a borrowed `Read + Write` stream and
//! return the agreed identifier or a [`SelectError`](crate::SelectError).
//! They carry no state between calls and never read past the final handshake
//! frame, so the stream can be handed to another protocol as soon as they
//! return.
//!
//! Header ordering avoids a write-write stall on unbuffered transports: the
//! listener speaks first, the dialer answers only after validating the
//! listener's header.
//!
//! # Examples
//!
//! ```
//! use protocol::{negotiate_listener, select_one_of};
//! use std::io::{Cursor, Read, Write};
//!
//! // Record the listener's replies to a scripted dialer.
//! struct Scripted {
//!     input: Cursor<Vec<u8>>,
//!     output: Vec<u8>,
//! }
//!
//! impl Read for Scripted {
//!     fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
//!         self.input.read(buf)
//!     }
//! }
//!
//! impl Write for Scripted {
//!     fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
//!         self.output.write(buf)
//!     }
//!     fn flush(&mut self) -> std::io::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let mut dialer_bytes = Vec::new();
//! protocol::write_token(&mut dialer_bytes, protocol::MULTISTREAM_PROTOCOL_ID).unwrap();
//! protocol::write_token(&mut dialer_bytes, "/chat/1.0.0").unwrap();
//!
//! let mut stream = Scripted { input: Cursor::new(dialer_bytes), output: Vec::new() };
//! let agreed = negotiate_listener(&["/chat/1.0.0"], &mut stream).expect("listener agrees");
//! assert_eq!(agreed, "/chat/1.0.0");
//!
//! // Replaying the listener's output to a dialer yields the same identifier.
//! let mut replay = Scripted { input: Cursor::new(stream.output), output: Vec::new() };
//! let selected = select_one_of(&["/chat/1.0.0"], &mut replay).expect("dialer agrees");
//! assert_eq!(selected, agreed);
//! ```

mod dialer;
mod listener;

pub use dialer::{list_protocols, select_one_of, select_proto_or_fail};
pub use listener::{MAX_RECORDED_PROPOSAL_LEN, MAX_RECORDED_REJECTIONS, negotiate_listener};
