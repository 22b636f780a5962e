#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logging` turns the command line's verbosity flags into tracing filters
//! for protomux binaries. The library crates never install a subscriber;
//! they only emit events under two targets:
//!
//! - [`NEGOTIATE_TARGET`] for per-connection negotiation outcomes, and
//! - [`WIRE_TARGET`] for every handshake token sent or received.
//!
//! # Design
//!
//! [`VerbosityConfig`] holds one [`LogLevel`] per target plus a default for
//! everything else and renders itself as `EnvFilter` directives. With the
//! `tracing` feature enabled, [`init_tracing`] installs a `fmt` subscriber on
//! standard error using those directives, or the `PROTOMUX_LOG` environment
//! variable when it is set.
//!
//! # Examples
//!
//! ```
//! use logging::{LogLevel, VerbosityConfig};
//!
//! let config = VerbosityConfig::from_verbose_level(2);
//! assert_eq!(config.wire, LogLevel::Trace);
//! assert!(config.directives().contains("protomux::wire=trace"));
//! ```

mod config;
#[cfg(feature = "tracing")]
mod tracing_bridge;

pub use config::{LogLevel, NEGOTIATE_TARGET, VerbosityConfig, WIRE_TARGET};
#[cfg(feature = "tracing")]
pub use tracing_bridge::{
    LOG_ENV_VAR, LoggingError, env_filter, init_tracing, parse_filter, subscriber,
};
