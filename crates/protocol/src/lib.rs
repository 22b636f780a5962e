#![deny(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

//! Multistream-select wire codec and handshake algorithms.
//!
//! The crate is split into small modules mirroring the layers of the
//! protocol: the [`uvarint`](encode_uvarint_to_vec) length prefix, newline
//! terminated token frames, the reserved tokens exchanged during a handshake,
//! and the dialer / listener algorithms built on top of them. Everything here
//! operates on borrowed [`std::io::Read`] + [`std::io::Write`] streams and owns
//! no connection state; deadlines and transport dispatch live in the
//! `transport` crate.
//!
//! # Examples
//!
//! Classify the tokens a listener receives:
//!
//! ```
//! use protocol::{Message, MULTISTREAM_PROTOCOL_ID};
//!
//! assert_eq!(Message::parse(MULTISTREAM_PROTOCOL_ID), Message::Header);
//! assert_eq!(Message::parse("na"), Message::NotAvailable);
//! assert_eq!(Message::parse("/echo/1.0.0"), Message::Protocol("/echo/1.0.0"));
//! ```
//!
//! Frame a token and read it back without consuming trailing bytes:
//!
//! ```
//! use protocol::{read_token, write_token};
//! use std::io::{Cursor, Read};
//!
//! let mut wire = Vec::new();
//! write_token(&mut wire, "/chat/1.0.0").unwrap();
//! wire.extend_from_slice(b"hello");
//!
//! let mut cursor = Cursor::new(wire);
//! assert_eq!(read_token(&mut cursor).unwrap(), "/chat/1.0.0");
//!
//! let mut rest = String::new();
//! cursor.read_to_string(&mut rest).unwrap();
//! assert_eq!(rest, "hello");
//! ```

mod error;
mod frame;
mod message;
mod select;
mod trace;
mod varint;

pub use error::{FrameError, SelectError};
pub use frame::{
    MAX_FRAME_LEN, decode_frame, encode_frame_to_vec, read_frame, read_frame_or_eof, read_token,
    read_token_or_eof, write_frame, write_token,
};
pub use message::{
    LIST_PROTOCOLS, MULTISTREAM_PROTOCOL_ID, Message, NOT_AVAILABLE, decode_protocol_list,
    encode_protocol_list,
};
pub use select::{
    MAX_RECORDED_PROPOSAL_LEN, MAX_RECORDED_REJECTIONS, list_protocols, negotiate_listener,
    select_one_of, select_proto_or_fail,
};
pub use varint::{
    MAX_UVARINT_LEN, decode_uvarint, encode_uvarint_to_vec, read_uvarint, read_uvarint_or_eof,
    write_uvarint,
};
