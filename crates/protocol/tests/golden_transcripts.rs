//! Byte-exact handshake transcripts.
//!
//! Each test scripts the peer's bytes, runs one side of the handshake, and
//! compares everything written against the expected wire image.

use std::io::{self, Cursor, Read, Write};

use protocol::{
    MULTISTREAM_PROTOCOL_ID, SelectError, encode_frame_to_vec, list_protocols, negotiate_listener,
    select_one_of, select_proto_or_fail,
};

const ECHO: &str = "/echo/1.0.0";
const CHAT: &str = "/chat/1.0.0";

/// `0x13` is `len("/multistream/1.0.0\n")`.
const HEADER: &[u8] = b"\x13/multistream/1.0.0\n";
const NA: &[u8] = b"\x03na\n";
const LS: &[u8] = b"\x03ls\n";
const ECHO_FRAME: &[u8] = b"\x0c/echo/1.0.0\n";
const CHAT_FRAME: &[u8] = b"\x0c/chat/1.0.0\n";

/// A peer whose replies are fixed in advance.
struct Transcript {
    incoming: Cursor<Vec<u8>>,
    outgoing: Vec<u8>,
}

impl Transcript {
    fn new(parts: &[&[u8]]) -> Self {
        Self {
            incoming: Cursor::new(parts.concat()),
            outgoing: Vec::new(),
        }
    }

    fn unread(&self) -> &[u8] {
        let position = usize::try_from(self.incoming.position()).expect("position fits");
        &self.incoming.get_ref()[position..]
    }
}

impl Read for Transcript {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.incoming.read(buf)
    }
}

impl Write for Transcript {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.outgoing.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn header_frame_is_twenty_bytes() {
    let mut frame = Vec::new();
    encode_frame_to_vec(MULTISTREAM_PROTOCOL_ID.as_bytes(), &mut frame).expect("encode");
    assert_eq!(frame, HEADER);
    assert_eq!(frame.len(), 20);
}

#[test]
fn long_identifiers_use_a_two_byte_length_prefix() {
    let identifier = format!("/{}", "x".repeat(199));
    let mut frame = Vec::new();
    encode_frame_to_vec(identifier.as_bytes(), &mut frame).expect("encode");
    assert_eq!(&frame[..2], &[0xC9, 0x01]);
    assert_eq!(frame.len(), 2 + 200 + 1);
}

#[test]
fn dialer_accepted_on_first_proposal() {
    let mut peer = Transcript::new(&[HEADER, ECHO_FRAME]);
    let agreed = select_one_of(&[ECHO], &mut peer).expect("agreement");
    assert_eq!(agreed, ECHO);
    assert_eq!(peer.outgoing, [HEADER, ECHO_FRAME].concat());
}

#[test]
fn dialer_falls_back_after_rejection() {
    let mut peer = Transcript::new(&[HEADER, NA, CHAT_FRAME]);
    let agreed = select_one_of(&[ECHO, CHAT], &mut peer).expect("agreement");
    assert_eq!(agreed, CHAT);
    assert_eq!(peer.outgoing, [HEADER, ECHO_FRAME, CHAT_FRAME].concat());
}

#[test]
fn dialer_leaves_application_bytes_unread() {
    let mut peer = Transcript::new(&[HEADER, ECHO_FRAME, b"application data"]);
    select_proto_or_fail(ECHO, &mut peer).expect("agreement");
    assert_eq!(peer.unread(), b"application data");
}

#[test]
fn dialer_exhausting_proposals_reports_them_in_order() {
    let mut peer = Transcript::new(&[HEADER, NA, NA]);
    let err = select_one_of(&[ECHO, CHAT], &mut peer).expect_err("no agreement");
    assert!(matches!(
        err,
        SelectError::NotSupported { ref proposed } if proposed == &[ECHO, CHAT]
    ));
    assert_eq!(peer.outgoing, [HEADER, ECHO_FRAME, CHAT_FRAME].concat());
}

#[test]
fn dialer_rejects_foreign_header_without_answering() {
    let mut peer = Transcript::new(&[b"\x0d/other/1.0.0\n"]);
    let err = select_one_of(&[ECHO], &mut peer).expect_err("header mismatch");
    assert!(err.is_malformed());
    assert!(peer.outgoing.is_empty());
}

#[test]
fn listener_rejects_then_accepts() {
    let mut peer = Transcript::new(&[HEADER, b"\x03/x\n", ECHO_FRAME, b"tail"]);
    let agreed = negotiate_listener(&[ECHO], &mut peer).expect("agreement");
    assert_eq!(agreed, ECHO);
    assert_eq!(peer.outgoing, [HEADER, NA, ECHO_FRAME].concat());
    assert_eq!(peer.unread(), b"tail");
}

#[test]
fn listener_answers_listing_and_keeps_going() {
    let mut peer = Transcript::new(&[HEADER, LS, CHAT_FRAME]);
    let agreed = negotiate_listener(&[ECHO, CHAT], &mut peer).expect("agreement");
    assert_eq!(agreed, CHAT);

    // Outer frame length: two 13-byte inner frames plus the newline.
    let listing = [&[27u8][..], ECHO_FRAME, CHAT_FRAME, &b"\n"[..]].concat();
    assert_eq!(peer.outgoing, [HEADER, listing.as_slice(), CHAT_FRAME].concat());
}

#[test]
fn listener_reports_rejections_when_dialer_gives_up() {
    let mut peer = Transcript::new(&[HEADER, b"\x03/a\n", b"\x03/b\n"]);
    let err = negotiate_listener(&[ECHO], &mut peer).expect_err("dialer gave up");
    assert!(matches!(
        err,
        SelectError::NoneAccepted { ref rejected, omitted: 0 } if rejected == &["/a", "/b"]
    ));
    assert_eq!(peer.outgoing, [HEADER, NA, NA].concat());
}

#[test]
fn dialer_listing_transcript() {
    let listing = [&[27u8][..], ECHO_FRAME, CHAT_FRAME, &b"\n"[..]].concat();
    let mut peer = Transcript::new(&[HEADER, listing.as_slice()]);
    let listed = list_protocols(&mut peer).expect("listing");
    assert_eq!(listed, [ECHO, CHAT]);
    assert_eq!(peer.outgoing, [HEADER, LS].concat());
}
