//! crates/logging/src/config.rs
//! Verbosity configuration mapping `-v` counts onto per-target log levels.

use std::fmt;

/// Tracing target for negotiation outcomes.
pub const NEGOTIATE_TARGET: &str = "protomux::negotiate";

/// Tracing target for individual handshake tokens.
pub const WIRE_TARGET: &str = "protomux::wire";

/// Severity threshold for one group of events.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LogLevel {
    /// Nothing is recorded.
    Off,
    /// Errors only.
    Error,
    /// Errors and warnings.
    #[default]
    Warn,
    /// Informational messages.
    Info,
    /// Debug diagnostics.
    Debug,
    /// Everything, including per-token wire traces.
    Trace,
}

impl LogLevel {
    /// Returns the directive spelling understood by `EnvFilter`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-target verbosity derived from the command line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VerbosityConfig {
    /// Level for events outside the protomux targets.
    pub default: LogLevel,
    /// Level for [`NEGOTIATE_TARGET`] events.
    pub negotiate: LogLevel,
    /// Level for [`WIRE_TARGET`] events.
    pub wire: LogLevel,
}

impl VerbosityConfig {
    /// Create a configuration from a verbose level (number of `-v` flags).
    ///
    /// | level | default | negotiate | wire  |
    /// |-------|---------|-----------|-------|
    /// | 0     | warn    | warn      | off   |
    /// | 1     | info    | debug     | off   |
    /// | 2     | info    | trace     | trace |
    /// | 3+    | debug   | trace     | trace |
    #[must_use]
    pub const fn from_verbose_level(level: u8) -> Self {
        match level {
            0 => Self {
                default: LogLevel::Warn,
                negotiate: LogLevel::Warn,
                wire: LogLevel::Off,
            },
            1 => Self {
                default: LogLevel::Info,
                negotiate: LogLevel::Debug,
                wire: LogLevel::Off,
            },
            2 => Self {
                default: LogLevel::Info,
                negotiate: LogLevel::Trace,
                wire: LogLevel::Trace,
            },
            _ => Self {
                default: LogLevel::Debug,
                negotiate: LogLevel::Trace,
                wire: LogLevel::Trace,
            },
        }
    }

    /// Configuration that records errors only.
    #[must_use]
    pub const fn quiet() -> Self {
        Self {
            default: LogLevel::Error,
            negotiate: LogLevel::Error,
            wire: LogLevel::Off,
        }
    }

    /// Renders the configuration as a comma-separated filter directive list.
    ///
    /// ```
    /// use logging::VerbosityConfig;
    ///
    /// assert_eq!(
    ///     VerbosityConfig::from_verbose_level(1).directives(),
    ///     "info,protomux::negotiate=debug,protomux::wire=off"
    /// );
    /// ```
    #[must_use]
    pub fn directives(&self) -> String {
        format!(
            "{},{NEGOTIATE_TARGET}={},{WIRE_TARGET}={}",
            self.default, self.negotiate, self.wire
        )
    }
}

impl Default for VerbosityConfig {
    fn default() -> Self {
        Self::from_verbose_level(0)
    }
}
