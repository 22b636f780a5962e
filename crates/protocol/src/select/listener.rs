use std::io::{self, Read, Write};

use crate::error::SelectError;
use crate::frame::{MAX_FRAME_LEN, encode_frame_to_vec, read_token_or_eof, write_frame, write_token};
use crate::message::{LIST_PROTOCOLS, MULTISTREAM_PROTOCOL_ID, NOT_AVAILABLE};
use crate::trace::{trace_listing_truncated, trace_received, trace_rejected, trace_sent};

const SIDE: &str = "listener";

/// Number of rejected proposals a listener keeps for error reporting.
///
/// Later rejections are still answered with `na` but only counted.
pub const MAX_RECORDED_REJECTIONS: usize = 16;

/// Longest prefix, in bytes, kept of each recorded rejected proposal.
pub const MAX_RECORDED_PROPOSAL_LEN: usize = 256;

/// Bounded record of the proposals a listener turned down.
#[derive(Debug, Default)]
struct Rejections {
    recorded: Vec<String>,
    omitted: usize,
}

impl Rejections {
    fn record(&mut self, proposal: String) {
        if self.recorded.len() == MAX_RECORDED_REJECTIONS {
            self.omitted += 1;
            return;
        }
        self.recorded.push(shorten(proposal));
    }

    fn is_empty(&self) -> bool {
        self.recorded.is_empty() && self.omitted == 0
    }

    fn into_error(self) -> SelectError {
        SelectError::NoneAccepted {
            rejected: self.recorded,
            omitted: self.omitted,
        }
    }
}

fn shorten(mut proposal: String) -> String {
    if proposal.len() > MAX_RECORDED_PROPOSAL_LEN {
        let mut end = MAX_RECORDED_PROPOSAL_LEN;
        while !proposal.is_char_boundary(end) {
            end -= 1;
        }
        proposal.truncate(end);
        proposal.push_str("...");
    }
    proposal
}

/// Encodes as many of `supported` as fit in one outer frame.
///
/// Identifiers are kept in order; the listing stops at the first one that
/// would overflow [`MAX_FRAME_LEN`].
fn listing<P: AsRef<str>>(supported: &[P]) -> Vec<u8> {
    let mut payload = Vec::new();
    let mut entry = Vec::new();
    for (listed, protocol) in supported.iter().enumerate() {
        entry.clear();
        let fits = encode_frame_to_vec(protocol.as_ref().as_bytes(), &mut entry).is_ok()
            && payload.len() + entry.len() < MAX_FRAME_LEN;
        if !fits {
            trace_listing_truncated(listed, supported.len() - listed);
            break;
        }
        payload.extend_from_slice(&entry);
    }
    payload
}

fn send<S: Write + ?Sized>(stream: &mut S, token: &str) -> Result<(), SelectError> {
    write_token(stream, token)?;
    trace_sent(SIDE, token);
    Ok(())
}

fn recv<S: Read + ?Sized>(stream: &mut S) -> Result<Option<String>, SelectError> {
    let token = read_token_or_eof(stream)?;
    if let Some(token) = &token {
        trace_received(SIDE, token);
    }
    Ok(token)
}

fn closed_early(during: &str) -> SelectError {
    SelectError::Io(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("peer closed the stream during {during}"),
    ))
}

/// Runs the listener handshake against the identifiers in `supported`.
///
/// The listener sends its header, validates the dialer's header, then
/// answers proposals until one matches: a supported identifier is echoed and
/// returned, anything else is answered with `na`. An `ls` request is answered
/// with the `supported` list, cut short if it would not fit in one frame, and
/// does not end the exchange. Order within
/// `supported` is irrelevant; only membership is consulted.
///
/// # Errors
///
/// - [`SelectError::NoneAccepted`] if the dialer closed the stream after
///   proposing only unsupported identifiers. At most
///   [`MAX_RECORDED_REJECTIONS`] of them are kept, each shortened to
///   [`MAX_RECORDED_PROPOSAL_LEN`] bytes; the rest are only counted.
/// - [`SelectError::HeaderMismatch`] if the dialer opened with something other
///   than the multistream header.
/// - [`SelectError::Io`] for stream and framing failures, including an
///   end-of-stream before the first proposal and deadline expiry reported by
///   the stream.
pub fn negotiate_listener<S, P>(supported: &[P], stream: &mut S) -> Result<String, SelectError>
where
    S: Read + Write + ?Sized,
    P: AsRef<str>,
{
    send(stream, MULTISTREAM_PROTOCOL_ID)?;

    let Some(received) = recv(stream)? else {
        return Err(closed_early("the header exchange"));
    };
    if received != MULTISTREAM_PROTOCOL_ID {
        return Err(SelectError::HeaderMismatch { received });
    }

    let mut rejected = Rejections::default();
    loop {
        let Some(token) = recv(stream)? else {
            if rejected.is_empty() {
                return Err(closed_early("protocol selection"));
            }
            return Err(rejected.into_error());
        };

        if token == LIST_PROTOCOLS {
            write_frame(stream, &listing(supported))?;
            trace_sent(SIDE, LIST_PROTOCOLS);
            continue;
        }

        if supported.iter().any(|p| p.as_ref() == token) {
            send(stream, &token)?;
            return Ok(token);
        }

        trace_rejected(&token);
        send(stream, NOT_AVAILABLE)?;
        rejected.record(token);
    }
}
