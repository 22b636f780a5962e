use std::time::Duration;

/// Time budget applied to a negotiation when none is configured.
pub const DEFAULT_NEGOTIATE_TIMEOUT: Duration = Duration::from_secs(60);

/// How repeated registrations of the same identifier affect the initiating
/// side's preference order.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PreferencePolicy {
    /// Every registration appends to the preference list, so an identifier
    /// registered twice is proposed twice.
    #[default]
    KeepDuplicates,
    /// Re-registering an identifier replaces its transport without adding a
    /// second preference entry; the original position is kept.
    Deduplicate,
}

/// Settings for a [`NegotiatingTransport`](crate::NegotiatingTransport).
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use transport::{NegotiatorConfig, PreferencePolicy};
///
/// let config = NegotiatorConfig::default()
///     .with_negotiate_timeout(Duration::from_secs(5))
///     .with_preference_policy(PreferencePolicy::Deduplicate);
///
/// assert_eq!(config.negotiate_timeout(), Duration::from_secs(5));
/// assert!(config.deadline_enabled());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NegotiatorConfig {
    negotiate_timeout: Duration,
    preference_policy: PreferencePolicy,
}

impl NegotiatorConfig {
    /// Creates a configuration with the default 60 second budget.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            negotiate_timeout: DEFAULT_NEGOTIATE_TIMEOUT,
            preference_policy: PreferencePolicy::KeepDuplicates,
        }
    }

    /// Sets the time budget for a single negotiation.
    ///
    /// A zero duration disables the deadline entirely.
    #[must_use]
    pub const fn with_negotiate_timeout(mut self, timeout: Duration) -> Self {
        self.negotiate_timeout = timeout;
        self
    }

    /// Sets how duplicate registrations affect the preference order.
    #[must_use]
    pub const fn with_preference_policy(mut self, policy: PreferencePolicy) -> Self {
        self.preference_policy = policy;
        self
    }

    /// Returns the configured time budget.
    #[must_use]
    pub const fn negotiate_timeout(&self) -> Duration {
        self.negotiate_timeout
    }

    /// Returns the configured preference policy.
    #[must_use]
    pub const fn preference_policy(&self) -> PreferencePolicy {
        self.preference_policy
    }

    /// Reports whether negotiations arm a deadline on the connection.
    #[must_use]
    pub const fn deadline_enabled(&self) -> bool {
        !self.negotiate_timeout.is_zero()
    }
}

impl Default for NegotiatorConfig {
    fn default() -> Self {
        Self::new()
    }
}
