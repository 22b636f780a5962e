//! Reserved multistream-select tokens and the listing payload.

use std::io;

use crate::error::FrameError;
use crate::frame::{decode_frame, encode_frame_to_vec};

/// Header both peers exchange before any proposal.
pub const MULTISTREAM_PROTOCOL_ID: &str = "/multistream/1.0.0";

/// Listener response rejecting a proposal.
pub const NOT_AVAILABLE: &str = "na";

/// Dialer request asking the listener to enumerate its protocols.
pub const LIST_PROTOCOLS: &str = "ls";

/// Classified token received during a handshake.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Message<'a> {
    /// The multistream header.
    Header,
    /// A rejection of the previous proposal.
    NotAvailable,
    /// A request for the listener's protocol list.
    ListProtocols,
    /// A protocol identifier, either a proposal or an acceptance echo.
    Protocol(&'a str),
}

impl<'a> Message<'a> {
    /// Classifies a decoded token.
    #[must_use]
    pub fn parse(token: &'a str) -> Self {
        match token {
            MULTISTREAM_PROTOCOL_ID => Self::Header,
            NOT_AVAILABLE => Self::NotAvailable,
            LIST_PROTOCOLS => Self::ListProtocols,
            other => Self::Protocol(other),
        }
    }

    /// Returns the token that represents this message on the wire.
    #[must_use]
    pub const fn as_token(&self) -> &'a str {
        match self {
            Self::Header => MULTISTREAM_PROTOCOL_ID,
            Self::NotAvailable => NOT_AVAILABLE,
            Self::ListProtocols => LIST_PROTOCOLS,
            Self::Protocol(name) => name,
        }
    }
}

/// Builds the payload a listener sends in response to [`LIST_PROTOCOLS`].
///
/// The payload is itself a sequence of frames, one per identifier; the caller
/// wraps it in an outer frame.
///
/// # Errors
///
/// Returns [`io::ErrorKind::InvalidInput`] if an identifier is too long to be
/// framed.
pub fn encode_protocol_list<S: AsRef<str>>(protocols: &[S]) -> io::Result<Vec<u8>> {
    let mut payload = Vec::new();
    for protocol in protocols {
        encode_frame_to_vec(protocol.as_ref().as_bytes(), &mut payload)?;
    }
    Ok(payload)
}

/// Parses the payload produced by [`encode_protocol_list`].
///
/// # Errors
///
/// Returns [`io::ErrorKind::InvalidData`] or [`io::ErrorKind::UnexpectedEof`]
/// if the nested frames are malformed or not UTF-8.
pub fn decode_protocol_list(mut payload: &[u8]) -> io::Result<Vec<String>> {
    let mut protocols = Vec::new();
    while !payload.is_empty() {
        let (entry, rest) = decode_frame(payload)?;
        let entry = std::str::from_utf8(entry).map_err(|_| FrameError::InvalidUtf8)?;
        protocols.push(entry.to_owned());
        payload = rest;
    }
    Ok(protocols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_tokens_are_classified() {
        assert_eq!(Message::parse("/multistream/1.0.0"), Message::Header);
        assert_eq!(Message::parse("na"), Message::NotAvailable);
        assert_eq!(Message::parse("ls"), Message::ListProtocols);
        assert_eq!(
            Message::parse("/echo/1.0.0"),
            Message::Protocol("/echo/1.0.0")
        );
    }

    #[test]
    fn as_token_inverts_parse() {
        for token in ["/multistream/1.0.0", "na", "ls", "/chat/1.0.0"] {
            assert_eq!(Message::parse(token).as_token(), token);
        }
    }

    #[test]
    fn protocol_list_round_trips() {
        let payload = encode_protocol_list(&["/echo/1.0.0", "/chat/1.0.0"]).expect("encodes");
        assert_eq!(
            decode_protocol_list(&payload).expect("decodes"),
            ["/echo/1.0.0", "/chat/1.0.0"]
        );
    }

    #[test]
    fn empty_protocol_list_is_empty_payload() {
        let payload = encode_protocol_list::<&str>(&[]).expect("encodes");
        assert!(payload.is_empty());
        assert!(decode_protocol_list(&payload).expect("decodes").is_empty());
    }

    #[test]
    fn corrupt_protocol_list_is_rejected() {
        let err = decode_protocol_list(b"\x03/a\x00").expect_err("missing newline");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
