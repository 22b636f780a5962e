use std::io::{Read, Write};

use crate::error::SelectError;
use crate::frame::{read_frame, read_token, write_token};
use crate::message::{LIST_PROTOCOLS, MULTISTREAM_PROTOCOL_ID, NOT_AVAILABLE, decode_protocol_list};
use crate::trace::{trace_received, trace_sent};

const SIDE: &str = "dialer";

fn send<S: Write + ?Sized>(stream: &mut S, token: &str) -> Result<(), SelectError> {
    write_token(stream, token)?;
    trace_sent(SIDE, token);
    Ok(())
}

fn recv<S: Read + ?Sized>(stream: &mut S) -> Result<String, SelectError> {
    let token = read_token(stream)?;
    trace_received(SIDE, &token);
    Ok(token)
}

/// Waits for the listener's header and answers with our own.
fn handshake<S: Read + Write + ?Sized>(stream: &mut S) -> Result<(), SelectError> {
    let received = recv(stream)?;
    if received != MULTISTREAM_PROTOCOL_ID {
        return Err(SelectError::HeaderMismatch { received });
    }
    send(stream, MULTISTREAM_PROTOCOL_ID)
}

/// Proposes `protocol` and reports whether the listener accepted it.
fn try_select<S: Read + Write + ?Sized>(
    stream: &mut S,
    protocol: &str,
) -> Result<bool, SelectError> {
    send(stream, protocol)?;
    let response = recv(stream)?;
    if response == protocol {
        Ok(true)
    } else if response == NOT_AVAILABLE {
        Ok(false)
    } else {
        Err(SelectError::UnexpectedResponse {
            proposed: protocol.to_owned(),
            response,
        })
    }
}

/// Runs the dialer handshake, proposing `protocols` in order.
///
/// The first identifier the listener echoes back wins; rejected proposals are
/// skipped. The stream is left positioned immediately after the listener's
/// acceptance.
///
/// # Errors
///
/// - [`SelectError::NotSupported`] if the listener rejected every proposal
///   (including the degenerate case of an empty `protocols` slice).
/// - [`SelectError::HeaderMismatch`] or [`SelectError::UnexpectedResponse`]
///   if the listener violates the protocol.
/// - [`SelectError::Io`] for stream and framing failures, including deadline
///   expiry reported by the stream.
pub fn select_one_of<S, P>(protocols: &[P], stream: &mut S) -> Result<String, SelectError>
where
    S: Read + Write + ?Sized,
    P: AsRef<str>,
{
    handshake(stream)?;

    for protocol in protocols {
        let protocol = protocol.as_ref();
        if try_select(stream, protocol)? {
            return Ok(protocol.to_owned());
        }
    }

    Err(SelectError::NotSupported {
        proposed: protocols.iter().map(|p| p.as_ref().to_owned()).collect(),
    })
}

/// Runs the dialer handshake with a single proposal.
///
/// # Errors
///
/// Same as [`select_one_of`]; a rejection is reported as
/// [`SelectError::NotSupported`] carrying `protocol`.
pub fn select_proto_or_fail<S>(protocol: &str, stream: &mut S) -> Result<(), SelectError>
where
    S: Read + Write + ?Sized,
{
    select_one_of(&[protocol], stream).map(drop)
}

/// Runs the dialer header exchange and asks the listener for its protocols.
///
/// The listener keeps waiting for proposals afterwards; callers normally
/// close the stream once they have the list.
///
/// # Errors
///
/// - [`SelectError::HeaderMismatch`] if the listener does not speak
///   multistream-select.
/// - [`SelectError::Io`] for stream failures or a malformed listing.
pub fn list_protocols<S>(stream: &mut S) -> Result<Vec<String>, SelectError>
where
    S: Read + Write + ?Sized,
{
    handshake(stream)?;
    send(stream, LIST_PROTOCOLS)?;
    let payload = read_frame(stream)?;
    Ok(decode_protocol_list(&payload)?)
}
