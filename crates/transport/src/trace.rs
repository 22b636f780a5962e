//! Negotiation outcome tracing.
//!
//! Events are emitted under the `protomux::negotiate` target. With the
//! `tracing` feature disabled every helper compiles to nothing.

#[cfg(feature = "tracing")]
use tracing::{debug, trace};

use std::time::Duration;

use crate::error::NegotiationError;
use crate::role::Role;

/// Trace the start of a negotiation.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_started(role: Role, candidates: &[String], timeout: Duration) {
    trace!(
        target: "protomux::negotiate",
        role = role.as_str(),
        candidates = ?candidates,
        timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        "starting {} negotiation",
        role
    );
}

/// Trace the start of a negotiation - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_started(_role: Role, _candidates: &[String], _timeout: Duration) {}

/// Trace an agreed protocol.
///
/// # Arguments
///
/// * `role` - Side the negotiation ran on
/// * `protocol` - Identifier both peers agreed on
/// * `elapsed` - Time spent in the handshake
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_agreed(role: Role, protocol: &str, elapsed: Duration) {
    debug!(
        target: "protomux::negotiate",
        role = role.as_str(),
        protocol = protocol,
        elapsed_us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
        "{} negotiation agreed on {:?}",
        role,
        protocol
    );
}

/// Trace an agreed protocol - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_agreed(_role: Role, _protocol: &str, _elapsed: Duration) {}

/// Trace a failed negotiation.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_failed(role: Role, error: &NegotiationError) {
    debug!(
        target: "protomux::negotiate",
        role = role.as_str(),
        timeout = error.is_timeout(),
        no_agreement = error.is_no_agreement(),
        "{} negotiation failed: {}",
        role,
        error
    );
}

/// Trace a failed negotiation - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_failed(_role: Role, _error: &NegotiationError) {}

/// Trace the hand-off of a negotiated connection to its transport.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_handoff(role: Role, protocol: &str) {
    trace!(
        target: "protomux::negotiate",
        role = role.as_str(),
        protocol = protocol,
        "handing {} connection to {:?} transport",
        role,
        protocol
    );
}

/// Trace the hand-off of a negotiated connection - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_handoff(_role: Role, _protocol: &str) {}
