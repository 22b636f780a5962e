//! crates/logging/src/tracing_bridge.rs
//! Subscriber construction for binaries that emit protomux tracing events.
//!
//! A [`VerbosityConfig`] is rendered into `EnvFilter` directives and combined
//! with a compact `fmt` layer. The [`LOG_ENV_VAR`] environment variable, when
//! set, replaces the verbosity-derived directives entirely so operators can
//! target individual modules without rebuilding.

use std::io;

use thiserror::Error;
use tracing::Subscriber;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::fmt::MakeWriter;

use super::config::VerbosityConfig;

/// Environment variable whose value overrides verbosity-derived filters.
pub const LOG_ENV_VAR: &str = "PROTOMUX_LOG";

/// Failures while installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The filter directives could not be parsed.
    #[error("invalid log filter {directives:?}: {source}")]
    InvalidFilter {
        /// Directives that failed to parse.
        directives: String,
        /// Parser diagnostic.
        source: ParseError,
    },
    /// A global subscriber was installed earlier in the process.
    #[error("tracing subscriber already installed")]
    AlreadyInstalled(#[from] SetGlobalDefaultError),
}

/// Parses `directives` into an [`EnvFilter`].
pub fn parse_filter(directives: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(directives).map_err(|source| LoggingError::InvalidFilter {
        directives: directives.to_owned(),
        source,
    })
}

/// Builds the filter for `config`, honouring [`LOG_ENV_VAR`] when set.
pub fn env_filter(config: &VerbosityConfig) -> Result<EnvFilter, LoggingError> {
    match std::env::var(LOG_ENV_VAR) {
        Ok(directives) if !directives.trim().is_empty() => parse_filter(&directives),
        _ => parse_filter(&config.directives()),
    }
}

/// Builds a subscriber that writes events allowed by `filter` to `writer`.
///
/// Timestamps and ANSI colours are omitted so output stays stable when
/// captured by tests or piped to files.
pub fn subscriber<W>(filter: EnvFilter, writer: W) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_target(true)
        .with_ansi(false)
        .without_time()
        .finish()
}

/// Initialize tracing on standard error with the given verbosity configuration.
///
/// # Example
///
/// ```rust,ignore
/// use logging::{VerbosityConfig, init_tracing};
///
/// init_tracing(&VerbosityConfig::from_verbose_level(2))?;
/// tracing::debug!(target: "protomux::negotiate", "ready");
/// ```
pub fn init_tracing(config: &VerbosityConfig) -> Result<(), LoggingError> {
    let filter = env_filter(config)?;
    tracing::subscriber::set_global_default(subscriber(filter, io::stderr))?;
    Ok(())
}
