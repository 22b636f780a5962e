use std::io;

use thiserror::Error;

use crate::frame::MAX_FRAME_LEN;

/// Errors raised while decoding a single multistream-select frame.
///
/// Framing failures are always surfaced to callers as [`io::Error`] values with
/// [`io::ErrorKind::InvalidData`]; the original [`FrameError`] remains
/// reachable through [`io::Error::get_ref`] for diagnostics.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum FrameError {
    /// The length prefix does not fit in a `u64`.
    #[error("variable-length integer overflows 64 bits")]
    VarintOverflow,
    /// The length prefix carries redundant continuation bytes.
    #[error("variable-length integer is not minimally encoded")]
    VarintNotMinimal,
    /// The announced frame length exceeds [`MAX_FRAME_LEN`].
    #[error("frame of {len} bytes exceeds the {max} byte limit", max = MAX_FRAME_LEN)]
    TooLarge {
        /// Length announced by the prefix.
        len: u64,
    },
    /// A zero-length frame has no room for the terminating newline.
    #[error("frame is empty")]
    Empty,
    /// The final byte of the frame is not `'\n'`.
    #[error("frame is not terminated by a newline")]
    MissingNewline,
    /// The frame payload is not valid UTF-8.
    #[error("frame payload is not valid UTF-8")]
    InvalidUtf8,
}

impl From<FrameError> for io::Error {
    fn from(err: FrameError) -> Self {
        Self::new(io::ErrorKind::InvalidData, err)
    }
}

/// Outcome of a failed dialer or listener handshake.
#[derive(Debug, Error)]
pub enum SelectError {
    /// Reading from or writing to the stream failed, including framing errors.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The peer opened with something other than the multistream header.
    #[error("peer sent {received:?} instead of the multistream header")]
    HeaderMismatch {
        /// Token received in place of the header.
        received: String,
    },
    /// The listener answered a proposal with neither an echo nor `na`.
    #[error("peer answered proposal {proposed:?} with unrecognized response {response:?}")]
    UnexpectedResponse {
        /// Identifier the dialer proposed.
        proposed: String,
        /// Token the listener sent back.
        response: String,
    },
    /// The dialer exhausted its proposals without an acceptance.
    #[error("peer supports none of the proposed protocols {proposed:?}")]
    NotSupported {
        /// Identifiers proposed, in order.
        proposed: Vec<String>,
    },
    /// The dialer closed the stream after every proposal it made was rejected.
    #[error(
        "peer gave up after proposing only unsupported protocols {rejected:?}{}",
        omitted_suffix(.omitted)
    )]
    NoneAccepted {
        /// First rejected identifiers, in the order received, each possibly
        /// shortened.
        rejected: Vec<String>,
        /// Rejections beyond the recorded ones.
        omitted: usize,
    },
}

/// Renders the count of rejections left out of an error message.
fn omitted_suffix(omitted: &usize) -> String {
    if *omitted == 0 {
        String::new()
    } else {
        format!(" and {omitted} more")
    }
}

impl SelectError {
    /// Reports whether the two peers lacked a common protocol.
    ///
    /// Both [`SelectError::NotSupported`] (dialer side) and
    /// [`SelectError::NoneAccepted`] (listener side) describe the same outcome
    /// observed from opposite ends of the stream.
    #[must_use]
    pub const fn is_no_agreement(&self) -> bool {
        matches!(self, Self::NotSupported { .. } | Self::NoneAccepted { .. })
    }

    /// Returns the identifiers that were considered and not agreed upon, if any.
    #[must_use]
    pub fn considered(&self) -> Option<&[String]> {
        match self {
            Self::NotSupported { proposed } => Some(proposed.as_slice()),
            Self::NoneAccepted { rejected, .. } => Some(rejected.as_slice()),
            _ => None,
        }
    }

    /// Returns the underlying I/O error, if the failure originated in the stream.
    #[must_use]
    pub const fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }

    /// Reports whether the stream rejected I/O because a deadline elapsed.
    ///
    /// Sockets with a read timeout report expiry as either
    /// [`io::ErrorKind::TimedOut`] or [`io::ErrorKind::WouldBlock`] depending on
    /// the platform, so both kinds are treated as timeouts.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        self.io_error().is_some_and(|err| {
            matches!(
                err.kind(),
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
            )
        })
    }

    /// Reports whether the peer violated the wire protocol.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        match self {
            Self::HeaderMismatch { .. } | Self::UnexpectedResponse { .. } => true,
            Self::Io(err) => err.kind() == io::ErrorKind::InvalidData,
            _ => false,
        }
    }
}
