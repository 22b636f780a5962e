use std::fmt;

/// Side of the connection a negotiation runs on.
///
/// The role selects which half of the handshake runs and is forwarded
/// unchanged to the transport that receives the negotiated connection, since
/// many transports frame their own traffic differently per side.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Role {
    /// The connection was accepted from a listener; this side answers proposals.
    Accepting,
    /// The connection was dialed; this side proposes identifiers in preference order.
    Initiating,
}

impl Role {
    /// Maps the conventional `is_server` flag onto a role.
    #[must_use]
    pub const fn from_is_server(is_server: bool) -> Self {
        if is_server {
            Self::Accepting
        } else {
            Self::Initiating
        }
    }

    /// Reports whether this is the accepting (server) side.
    #[must_use]
    pub const fn is_server(self) -> bool {
        matches!(self, Self::Accepting)
    }

    /// Returns a lowercase label used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accepting => "accepting",
            Self::Initiating => "initiating",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
