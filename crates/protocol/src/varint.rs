//! # Overview
//!
//! Every multistream-select frame starts with its length encoded as an
//! unsigned LEB128 integer (`uvarint`). Each byte carries seven bits of the
//! value, least significant group first; the high bit marks that another byte
//! follows.
//!
//! # Design
//!
//! The codec exposes a streaming API via [`read_uvarint`] and [`write_uvarint`],
//! plus [`encode_uvarint_to_vec`] and [`decode_uvarint`] for in-memory buffers.
//! The streaming reader pulls exactly one byte per read call so that it never
//! consumes bytes belonging to the payload that follows the prefix.
//!
//! # Examples
//!
//! ```
//! use protocol::{decode_uvarint, encode_uvarint_to_vec};
//!
//! let mut encoded = Vec::new();
//! encode_uvarint_to_vec(300, &mut encoded);
//! assert_eq!(encoded, [0xAC, 0x02]);
//!
//! let (value, remainder) = decode_uvarint(&encoded).expect("uvarint decoding succeeds");
//! assert_eq!(value, 300);
//! assert!(remainder.is_empty());
//! ```

use std::io::{self, Read, Write};

use crate::error::FrameError;

/// Maximum number of bytes a `u64` occupies once encoded.
pub const MAX_UVARINT_LEN: usize = 10;

fn encode_bytes(mut value: u64) -> (usize, [u8; MAX_UVARINT_LEN]) {
    let mut bytes = [0u8; MAX_UVARINT_LEN];
    let mut len = 0;
    while value >= 0x80 {
        bytes[len] = (value as u8) | 0x80;
        value >>= 7;
        len += 1;
    }
    bytes[len] = value as u8;
    (len + 1, bytes)
}

/// Folds one encoded byte into the accumulator.
///
/// Returns `Ok(Some(value))` once the terminating byte has been seen and
/// `Ok(None)` while continuation bytes are still expected.
fn accumulate(acc: &mut u64, index: usize, byte: u8) -> Result<Option<u64>, FrameError> {
    if index == MAX_UVARINT_LEN - 1 && byte > 1 {
        return Err(FrameError::VarintOverflow);
    }

    *acc |= u64::from(byte & 0x7F) << (7 * index);
    if byte & 0x80 != 0 {
        return Ok(None);
    }

    // A zero terminator after at least one continuation byte is a non-minimal encoding.
    if byte == 0 && index > 0 {
        return Err(FrameError::VarintNotMinimal);
    }
    Ok(Some(*acc))
}

/// Appends the `uvarint` encoding of `value` to `out`.
pub fn encode_uvarint_to_vec(value: u64, out: &mut Vec<u8>) {
    let (len, bytes) = encode_bytes(value);
    out.extend_from_slice(&bytes[..len]);
}

/// Writes the `uvarint` encoding of `value` to `writer`.
///
/// # Errors
///
/// Propagates any error returned by `writer`.
pub fn write_uvarint<W: Write + ?Sized>(writer: &mut W, value: u64) -> io::Result<()> {
    let (len, bytes) = encode_bytes(value);
    writer.write_all(&bytes[..len])
}

/// Decodes a `uvarint` from the start of `bytes`.
///
/// Returns the value together with the unread remainder of the slice.
///
/// # Errors
///
/// - [`io::ErrorKind::UnexpectedEof`] when the slice ends before the
///   terminating byte.
/// - [`io::ErrorKind::InvalidData`] for encodings that overflow a `u64` or are
///   not minimal.
pub fn decode_uvarint(bytes: &[u8]) -> io::Result<(u64, &[u8])> {
    let mut acc = 0u64;
    for (index, &byte) in bytes.iter().enumerate().take(MAX_UVARINT_LEN) {
        if let Some(value) = accumulate(&mut acc, index, byte)? {
            return Ok((value, &bytes[index + 1..]));
        }
    }
    Err(io::Error::new(
        io::ErrorKind::UnexpectedEof,
        "truncated variable-length integer",
    ))
}

/// Reads a `uvarint` from `reader`, one byte at a time.
///
/// Returns `Ok(None)` if the stream ends cleanly before the first byte, which
/// lets callers tell an orderly close apart from a truncated frame.
///
/// # Errors
///
/// - [`io::ErrorKind::UnexpectedEof`] if the stream ends after the first byte
///   but before the terminating byte.
/// - [`io::ErrorKind::InvalidData`] for overflowing or non-minimal encodings.
/// - Any error reported by `reader`.
pub fn read_uvarint_or_eof<R: Read + ?Sized>(reader: &mut R) -> io::Result<Option<u64>> {
    let mut acc = 0u64;
    let mut byte = [0u8; 1];
    for index in 0..MAX_UVARINT_LEN {
        let read = loop {
            match reader.read(&mut byte) {
                Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                other => break other?,
            }
        };
        if read == 0 {
            if index == 0 {
                return Ok(None);
            }
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "truncated variable-length integer",
            ));
        }
        if let Some(value) = accumulate(&mut acc, index, byte[0])? {
            return Ok(Some(value));
        }
    }
    Err(FrameError::VarintOverflow.into())
}

/// Reads a `uvarint` from `reader`, treating end-of-stream as an error.
///
/// # Errors
///
/// Same as [`read_uvarint_or_eof`], plus [`io::ErrorKind::UnexpectedEof`]
/// when the stream is already closed.
pub fn read_uvarint<R: Read + ?Sized>(reader: &mut R) -> io::Result<u64> {
    read_uvarint_or_eof(reader)?.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "stream closed before variable-length integer",
        )
    })
}
