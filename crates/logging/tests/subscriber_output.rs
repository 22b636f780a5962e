#![cfg(feature = "tracing")]
//! Verifies which events reach the writer at each verbosity level.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use logging::{VerbosityConfig, parse_filter, subscriber};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Captured {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn capture(level: u8) -> String {
    let captured = Captured::default();
    let config = VerbosityConfig::from_verbose_level(level);
    let filter = parse_filter(&config.directives()).expect("directives parse");
    tracing::subscriber::with_default(subscriber(filter, captured.clone()), || {
        tracing::warn!(target: "protomux::cli", "listener stalled");
        tracing::debug!(target: "protomux::negotiate", protocol = "/echo/1.0.0", "agreed");
        tracing::trace!(target: "protomux::wire", token = "na", "dialer <- \"na\"");
    });
    captured.text()
}

#[test]
fn level_zero_shows_warnings_only() {
    let output = capture(0);
    assert!(output.contains("listener stalled"));
    assert!(!output.contains("agreed"));
    assert!(!output.contains("dialer <-"));
}

#[test]
fn level_one_adds_negotiation_outcomes() {
    let output = capture(1);
    assert!(output.contains("agreed"));
    assert!(output.contains("protomux::negotiate"));
    assert!(output.contains("/echo/1.0.0"));
    assert!(!output.contains("dialer <-"));
}

#[test]
fn level_two_adds_wire_tokens() {
    let output = capture(2);
    assert!(output.contains("agreed"));
    assert!(output.contains("dialer <-"));
}
