//! Failures surfaced by the command-line front-end and their exit codes.

use std::io;

use protocol::SelectError;
use thiserror::Error;
use transport::NegotiationError;

/// Exit code for a successful run.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for malformed command lines.
pub const EXIT_USAGE: i32 = 1;
/// Exit code when the peers did not complete a negotiation.
pub const EXIT_NEGOTIATION: i32 = 2;
/// Exit code for socket and session I/O failures.
pub const EXIT_IO: i32 = 3;

/// Error reported by [`crate::run`] before it exits.
#[derive(Debug, Error)]
pub enum CliError {
    /// The command line was rejected.
    #[error("{0}")]
    Usage(String),
    /// Negotiation with the peer failed.
    #[error("negotiation failed: {0}")]
    Negotiation(#[from] NegotiationError),
    /// The listener's protocol listing could not be obtained.
    #[error("listing failed: {0}")]
    Listing(#[from] SelectError),
    /// Socket or session I/O failed.
    #[error("{context}: {source}")]
    Io {
        /// Operation that was in progress.
        context: String,
        /// Underlying failure.
        source: io::Error,
    },
}

impl CliError {
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Process exit code for this failure.
    ///
    /// A listing that fails because the peer misbehaved or went silent is a
    /// negotiation failure; any other listing failure is an I/O failure.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) => EXIT_USAGE,
            Self::Negotiation(_) => EXIT_NEGOTIATION,
            Self::Listing(error) if error.is_malformed() || error.is_timeout() => EXIT_NEGOTIATION,
            Self::Listing(_) => EXIT_IO,
            Self::Io { .. } => EXIT_IO,
        }
    }
}
