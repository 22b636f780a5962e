use std::any::type_name;
use std::error::Error;
use std::fmt;
use std::io;
use std::time::Duration;

use protocol::SelectError;
use thiserror::Error;

use crate::registry::TransportError;
use crate::role::Role;

/// Reasons a negotiation can fail.
///
/// Variants up to and including [`NegotiationError::DeadlineClear`] describe
/// failures while the negotiator still owns the connection; the connection is
/// handed back to the caller inside a [`HandshakeFailure`]. A
/// [`NegotiationError::Transport`] failure happens after ownership moved to the
/// selected transport.
#[derive(Debug, Error)]
pub enum NegotiationError {
    /// No transport was registered when the negotiation started.
    #[error("no transports registered for {role} negotiation")]
    NothingRegistered {
        /// Side the negotiation would have run on.
        role: Role,
    },
    /// The connection refused the negotiation deadline.
    #[error("{role} negotiation could not arm its {timeout:?} deadline: {source}")]
    DeadlineSetup {
        /// Side the negotiation would have run on.
        role: Role,
        /// Budget that could not be applied.
        timeout: Duration,
        /// Error reported by the connection.
        source: io::Error,
    },
    /// The peer did not complete the handshake within the budget.
    #[error("{role} negotiation timed out after {timeout:?}")]
    TimedOut {
        /// Side the negotiation ran on.
        role: Role,
        /// Budget that elapsed.
        timeout: Duration,
        /// Timeout reported by the connection.
        source: io::Error,
    },
    /// The handshake failed on the wire.
    #[error("{role} negotiation failed: {source}")]
    Handshake {
        /// Side the negotiation ran on.
        role: Role,
        /// Underlying handshake failure.
        source: SelectError,
    },
    /// The peers share no protocol.
    #[error(
        "{role} negotiation found no common protocol among {considered:?}{}",
        omitted_suffix(.omitted)
    )]
    NoAgreement {
        /// Side the negotiation ran on.
        role: Role,
        /// Identifiers proposed (initiating side) or the first ones rejected
        /// (accepting side).
        considered: Vec<String>,
        /// Rejections the accepting side counted but did not record.
        omitted: usize,
    },
    /// The deadline could not be cleared after the handshake.
    ///
    /// A handshake failure that happened first is kept in `earlier`.
    #[error("{role} negotiation could not clear its deadline: {source}")]
    DeadlineClear {
        /// Side the negotiation ran on.
        role: Role,
        /// Error reported by the connection.
        source: io::Error,
        /// Handshake failure that preceded the clearing attempt.
        earlier: Option<Box<NegotiationError>>,
    },
    /// The agreed identifier has no registered transport.
    #[error("{role} negotiation agreed on {protocol:?}, which has no registered transport")]
    Unregistered {
        /// Side the negotiation ran on.
        role: Role,
        /// Identifier agreed with the peer.
        protocol: String,
    },
    /// The selected transport rejected the connection.
    #[error("transport for {protocol:?} failed to take over the {role} connection: {source}")]
    Transport {
        /// Side the negotiation ran on.
        role: Role,
        /// Identifier agreed with the peer.
        protocol: String,
        /// Error returned by the transport.
        source: TransportError,
    },
}

fn omitted_suffix(omitted: &usize) -> String {
    if *omitted == 0 {
        String::new()
    } else {
        format!(" and {omitted} more")
    }
}

impl NegotiationError {
    /// Classifies a handshake failure observed on `role` under `timeout`.
    pub(crate) fn from_select(err: SelectError, role: Role, timeout: Duration) -> Self {
        if err.is_timeout() {
            return match err {
                SelectError::Io(source) => Self::TimedOut {
                    role,
                    timeout,
                    source,
                },
                other => Self::Handshake {
                    role,
                    source: other,
                },
            };
        }
        match err {
            SelectError::NotSupported { proposed } => Self::NoAgreement {
                role,
                considered: proposed,
                omitted: 0,
            },
            SelectError::NoneAccepted { rejected, omitted } => Self::NoAgreement {
                role,
                considered: rejected,
                omitted,
            },
            other => Self::Handshake {
                role,
                source: other,
            },
        }
    }

    /// Returns the side the negotiation ran on.
    #[must_use]
    pub const fn role(&self) -> Role {
        match self {
            Self::NothingRegistered { role }
            | Self::DeadlineSetup { role, .. }
            | Self::TimedOut { role, .. }
            | Self::Handshake { role, .. }
            | Self::NoAgreement { role, .. }
            | Self::DeadlineClear { role, .. }
            | Self::Unregistered { role, .. }
            | Self::Transport { role, .. } => *role,
        }
    }

    /// Reports whether the peers share no protocol.
    #[must_use]
    pub const fn is_no_agreement(&self) -> bool {
        matches!(self, Self::NoAgreement { .. })
    }

    /// Reports whether the negotiation exceeded its time budget.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// Reports whether the failure happened after the selected transport took
    /// ownership of the connection.
    #[must_use]
    pub const fn is_transport_failure(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Returns the identifiers considered without agreement.
    #[must_use]
    pub fn considered(&self) -> Option<&[String]> {
        match self {
            Self::NoAgreement { considered, .. } => Some(considered),
            _ => None,
        }
    }

    /// Returns the agreed identifier for failures that happened after agreement.
    #[must_use]
    pub fn protocol(&self) -> Option<&str> {
        match self {
            Self::Unregistered { protocol, .. } | Self::Transport { protocol, .. } => Some(protocol),
            _ => None,
        }
    }
}

/// Failed negotiation together with the connection, when it is still owned.
///
/// The negotiator hands the raw connection back on every failure that happens
/// before a transport takes it over, so callers decide whether to close it,
/// log the peer, or retry. After a [`NegotiationError::Transport`] failure the
/// connection is gone and [`HandshakeFailure::connection`] returns `None`.
pub struct HandshakeFailure<C> {
    error: NegotiationError,
    connection: Option<C>,
}

impl<C> HandshakeFailure<C> {
    pub(crate) const fn new(error: NegotiationError, connection: Option<C>) -> Self {
        Self { error, connection }
    }

    /// Returns the reason the negotiation failed.
    #[must_use]
    pub const fn error(&self) -> &NegotiationError {
        &self.error
    }

    /// Returns the connection, if the negotiator still owned it on failure.
    #[must_use]
    pub const fn connection(&self) -> Option<&C> {
        self.connection.as_ref()
    }

    /// Returns a mutable reference to the retained connection.
    #[must_use]
    pub fn connection_mut(&mut self) -> Option<&mut C> {
        self.connection.as_mut()
    }

    /// Consumes the failure and returns the retained connection.
    #[must_use]
    pub fn into_connection(self) -> Option<C> {
        self.connection
    }

    /// Consumes the failure and returns the error.
    #[must_use]
    pub fn into_error(self) -> NegotiationError {
        self.error
    }

    /// Consumes the failure and returns both parts.
    #[must_use]
    pub fn into_parts(self) -> (NegotiationError, Option<C>) {
        (self.error, self.connection)
    }
}

impl<C> fmt::Debug for HandshakeFailure<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandshakeFailure")
            .field("error", &self.error)
            .field("connection", &type_name::<C>())
            .field("retained", &self.connection.is_some())
            .finish()
    }
}

impl<C> fmt::Display for HandshakeFailure<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<C> Error for HandshakeFailure<C> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

impl<C> From<HandshakeFailure<C>> for NegotiationError {
    fn from(failure: HandshakeFailure<C>) -> Self {
        failure.error
    }
}
