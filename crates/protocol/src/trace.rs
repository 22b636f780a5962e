//! Token-level handshake tracing.
//!
//! Events are emitted under the `protomux::wire` target. With the `tracing`
//! feature disabled every helper compiles to nothing.

#[cfg(feature = "tracing")]
use tracing::trace;

/// Trace a token written to the peer.
///
/// # Arguments
///
/// * `side` - `"dialer"` or `"listener"`
/// * `token` - Token payload without framing
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_sent(side: &'static str, token: &str) {
    trace!(
        target: "protomux::wire",
        side = side,
        direction = "sent",
        token = token,
        "{} -> {:?}",
        side,
        token
    );
}

/// Trace a token written to the peer - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_sent(_side: &'static str, _token: &str) {}

/// Trace a token read from the peer.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_received(side: &'static str, token: &str) {
    trace!(
        target: "protomux::wire",
        side = side,
        direction = "received",
        token = token,
        "{} <- {:?}",
        side,
        token
    );
}

/// Trace a token read from the peer - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_received(_side: &'static str, _token: &str) {}

/// Trace the listener rejecting a proposal.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_rejected(proposal: &str) {
    trace!(
        target: "protomux::wire",
        side = "listener",
        proposal = proposal,
        "listener rejected {:?}",
        proposal
    );
}

/// Trace the listener rejecting a proposal - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_rejected(_proposal: &str) {}

/// Trace a protocol listing cut short to fit one frame.
#[cfg(feature = "tracing")]
#[inline]
pub(crate) fn trace_listing_truncated(listed: usize, omitted: usize) {
    tracing::debug!(
        target: "protomux::wire",
        side = "listener",
        listed = listed,
        omitted = omitted,
        "listing truncated to {} identifiers",
        listed
    );
}

/// Trace a truncated listing - no-op when tracing is disabled.
#[cfg(not(feature = "tracing"))]
#[inline]
pub(crate) fn trace_listing_truncated(_listed: usize, _omitted: usize) {}
