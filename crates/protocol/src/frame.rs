//! # Overview
//!
//! Multistream-select exchanges short UTF-8 tokens. Each token travels in a
//! frame laid out as `uvarint(len + 1) ‖ token ‖ '\n'`: the length prefix
//! counts the payload plus its terminating newline.
//!
//! # Design
//!
//! Writers assemble the complete frame in memory and hand it to the stream in
//! a single `write_all`, so a peer never observes a half-written prefix.
//! Readers consume the prefix byte by byte and then exactly the announced
//! number of bytes; nothing beyond the frame is pulled from the stream.
//!
//! # Invariants
//!
//! - Frames longer than [`MAX_FRAME_LEN`] are rejected on both the encode and
//!   decode paths.
//! - Every decoded frame ended in `'\n'`; the newline is stripped before the
//!   payload is returned.
//!
//! # Examples
//!
//! ```
//! use protocol::{read_token, write_token};
//! use std::io::Cursor;
//!
//! let mut wire = Vec::new();
//! write_token(&mut wire, "/echo/1.0.0").expect("in-memory write succeeds");
//! assert_eq!(wire[0] as usize, "/echo/1.0.0".len() + 1);
//!
//! let token = read_token(&mut Cursor::new(wire)).expect("frame decodes");
//! assert_eq!(token, "/echo/1.0.0");
//! ```

use std::io::{self, Read, Write};

use crate::error::FrameError;
use crate::varint::{decode_uvarint, encode_uvarint_to_vec, read_uvarint_or_eof};

/// Largest frame accepted on the wire, counting the terminating newline.
pub const MAX_FRAME_LEN: usize = 64 * 1024;

fn check_len(len: u64) -> Result<usize, FrameError> {
    if len == 0 {
        return Err(FrameError::Empty);
    }
    if len > MAX_FRAME_LEN as u64 {
        return Err(FrameError::TooLarge { len });
    }
    Ok(len as usize)
}

fn strip_newline(mut frame: Vec<u8>) -> Result<Vec<u8>, FrameError> {
    match frame.pop() {
        Some(b'\n') => Ok(frame),
        _ => Err(FrameError::MissingNewline),
    }
}

fn into_token(payload: Vec<u8>) -> io::Result<String> {
    String::from_utf8(payload).map_err(|_| FrameError::InvalidUtf8.into())
}

/// Appends the frame carrying `payload` to `out`.
///
/// # Errors
///
/// Returns [`io::ErrorKind::InvalidInput`] if the framed payload would exceed
/// [`MAX_FRAME_LEN`].
pub fn encode_frame_to_vec(payload: &[u8], out: &mut Vec<u8>) -> io::Result<()> {
    let len = payload.len() + 1;
    if len > MAX_FRAME_LEN {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            FrameError::TooLarge { len: len as u64 },
        ));
    }

    out.reserve(len + 3);
    encode_uvarint_to_vec(len as u64, out);
    out.extend_from_slice(payload);
    out.push(b'\n');
    Ok(())
}

/// Writes one frame carrying `payload` and flushes the writer.
///
/// # Errors
///
/// Returns [`io::ErrorKind::InvalidInput`] for oversized payloads and
/// propagates any error reported by `writer`.
pub fn write_frame<W: Write + ?Sized>(writer: &mut W, payload: &[u8]) -> io::Result<()> {
    let mut frame = Vec::new();
    encode_frame_to_vec(payload, &mut frame)?;
    writer.write_all(&frame)?;
    writer.flush()
}

/// Writes `token` as a single frame.
///
/// # Errors
///
/// See [`write_frame`].
pub fn write_token<W: Write + ?Sized>(writer: &mut W, token: &str) -> io::Result<()> {
    write_frame(writer, token.as_bytes())
}

/// Reads one frame and returns its payload without the trailing newline.
///
/// Returns `Ok(None)` if the stream ended cleanly on a frame boundary.
///
/// # Errors
///
/// - [`io::ErrorKind::InvalidData`] for oversized, empty or unterminated
///   frames and for malformed length prefixes.
/// - [`io::ErrorKind::UnexpectedEof`] if the stream ends inside a frame.
/// - Any error reported by `reader`.
pub fn read_frame_or_eof<R: Read + ?Sized>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let Some(len) = read_uvarint_or_eof(reader)? else {
        return Ok(None);
    };
    let len = check_len(len)?;

    let mut frame = vec![0u8; len];
    reader.read_exact(&mut frame)?;
    Ok(Some(strip_newline(frame)?))
}

/// Reads one frame, treating a clean end-of-stream as an error.
///
/// # Errors
///
/// Same as [`read_frame_or_eof`], plus [`io::ErrorKind::UnexpectedEof`] when
/// the stream is already closed.
pub fn read_frame<R: Read + ?Sized>(reader: &mut R) -> io::Result<Vec<u8>> {
    read_frame_or_eof(reader)?.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "stream closed before the next frame",
        )
    })
}

/// Reads one frame and decodes it as a UTF-8 token.
///
/// Returns `Ok(None)` if the stream ended cleanly on a frame boundary.
///
/// # Errors
///
/// Same as [`read_frame_or_eof`], plus [`io::ErrorKind::InvalidData`] when the
/// payload is not valid UTF-8.
pub fn read_token_or_eof<R: Read + ?Sized>(reader: &mut R) -> io::Result<Option<String>> {
    read_frame_or_eof(reader)?.map(into_token).transpose()
}

/// Reads one frame and decodes it as a UTF-8 token.
///
/// # Errors
///
/// Same as [`read_frame`], plus [`io::ErrorKind::InvalidData`] when the
/// payload is not valid UTF-8.
pub fn read_token<R: Read + ?Sized>(reader: &mut R) -> io::Result<String> {
    into_token(read_frame(reader)?)
}

/// Decodes the frame at the start of `bytes`.
///
/// Returns the payload without its newline together with the unread
/// remainder of the slice.
///
/// # Errors
///
/// Same conditions as [`read_frame`], reported against the slice.
pub fn decode_frame(bytes: &[u8]) -> io::Result<(&[u8], &[u8])> {
    let (len, rest) = decode_uvarint(bytes)?;
    let len = check_len(len)?;
    if rest.len() < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "truncated frame",
        ));
    }

    let (frame, rest) = rest.split_at(len);
    match frame.split_last() {
        Some((b'\n', payload)) => Ok((payload, rest)),
        _ => Err(FrameError::MissingNewline.into()),
    }
}
