//! Protocol registry shared by every negotiation on a [`NegotiatingTransport`].
//!
//! The registry maps identifiers to transports and separately records the
//! order identifiers were registered in. The accepting side answers with map
//! membership; the initiating side proposes in registration order. Both views
//! are snapshotted under a read lock and released before any I/O happens, so
//! registrations never wait behind a slow handshake.
//!
//! [`NegotiatingTransport`]: crate::NegotiatingTransport

use std::error::Error;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rustc_hash::{FxHashMap, FxHashSet};

use crate::config::PreferencePolicy;
use crate::role::Role;

/// Boxed error returned by a [`StreamTransport`] that failed to take over a
/// negotiated connection.
pub type TransportError = Box<dyn Error + Send + Sync>;

/// A transport that takes ownership of a connection once its protocol has
/// been agreed.
///
/// Implementations receive the connection positioned at the first byte after
/// the handshake together with the [`Role`] the negotiation ran in. Closures
/// with a matching signature implement this trait directly.
///
/// # Examples
///
/// ```
/// use transport::{Role, StreamTransport, TransportError};
///
/// let upgrade = |conn: Vec<u8>, role: Role| -> Result<(usize, Role), TransportError> {
///     Ok((conn.len(), role))
/// };
/// let (len, role) = upgrade.new_conn(vec![1, 2, 3], Role::Initiating).unwrap();
/// assert_eq!((len, role), (3, Role::Initiating));
/// ```
pub trait StreamTransport<C>: Send + Sync {
    /// Connection type produced by this transport.
    type Output;

    /// Takes over `conn` after negotiation selected this transport.
    fn new_conn(&self, conn: C, role: Role) -> Result<Self::Output, TransportError>;
}

impl<C, O, F> StreamTransport<C> for F
where
    F: Fn(C, Role) -> Result<O, TransportError> + Send + Sync,
{
    type Output = O;

    fn new_conn(&self, conn: C, role: Role) -> Result<O, TransportError> {
        self(conn, role)
    }
}

/// Shared handle to a registered transport.
pub type SharedTransport<C, O> = Arc<dyn StreamTransport<C, Output = O>>;

struct RegistryState<C, O> {
    transports: FxHashMap<String, SharedTransport<C, O>>,
    preferences: Vec<String>,
}

/// Thread-safe identifier to transport map with a registration order.
pub(crate) struct Registry<C, O> {
    state: RwLock<RegistryState<C, O>>,
}

impl<C, O> Registry<C, O> {
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState {
                transports: FxHashMap::default(),
                preferences: Vec::new(),
            }),
        }
    }

    // Every update leaves the state consistent, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, RegistryState<C, O>> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState<C, O>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `transport` under `protocol`, replacing any previous entry.
    pub(crate) fn register(
        &self,
        protocol: String,
        transport: SharedTransport<C, O>,
        policy: PreferencePolicy,
    ) {
        let mut state = self.write();
        let replaced = state
            .transports
            .insert(protocol.clone(), transport)
            .is_some();
        if !(replaced && policy == PreferencePolicy::Deduplicate) {
            state.preferences.push(protocol);
        }
    }

    /// Looks up the transport currently registered under `protocol`.
    pub(crate) fn get(&self, protocol: &str) -> Option<SharedTransport<C, O>> {
        self.read().transports.get(protocol).cloned()
    }

    /// Snapshot of the identifiers the accepting side advertises and accepts.
    ///
    /// Each identifier appears once, in the order it was first registered.
    pub(crate) fn supported(&self) -> Vec<String> {
        let state = self.read();
        let mut seen = FxHashSet::default();
        state
            .preferences
            .iter()
            .filter(|protocol| seen.insert(protocol.as_str()))
            .cloned()
            .collect()
    }

    /// Snapshot of the initiating side's proposal order.
    pub(crate) fn preferences(&self) -> Vec<String> {
        self.read().preferences.clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.read().transports.len()
    }
}

#[cfg(test)]
mod tests;
