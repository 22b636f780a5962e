#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `cli` implements the `protomux` command-line front-end. It drives the
//! negotiating transport over TCP in either direction:
//!
//! - `protomux listen ADDR -p ID...` accepts one connection at a time,
//!   negotiates as the accepting side and echoes lines on whichever
//!   identifier was agreed. A session that stays silent for
//!   `--idle-timeout SECS` is closed so the next peer can be served.
//! - `protomux dial ADDR -p ID... [--message TEXT]` negotiates as the
//!   initiating side, prints the agreed identifier and, when asked, sends one
//!   line and prints the echo. `--list` asks the listener for its identifiers
//!   instead.
//!
//! `--timeout SECS` bounds each negotiation (`0` disables the deadline) and
//! `-v` raises log verbosity; both may appear before or after the
//! subcommand.
//!
//! # Design
//!
//! [`run`] accepts an iterator of arguments together with handles for
//! standard output and error so tests can capture everything the binary
//! prints. A [`clap`] command definition parses the arguments; negotiation
//! itself is delegated to [`transport::NegotiatingTransport`] with a built-in
//! line-echo transport registered under every `-p` identifier.
//!
//! # Errors
//!
//! Every failure is rendered on standard error and mapped to an exit code:
//! [`EXIT_USAGE`] for command-line errors, [`EXIT_NEGOTIATION`] when the
//! peers do not complete a negotiation, and [`EXIT_IO`] for socket failures.
//!
//! # Examples
//!
//! ```
//! let mut stdout = Vec::new();
//! let mut stderr = Vec::new();
//! let exit_code = cli::run(["protomux", "--version"], &mut stdout, &mut stderr);
//!
//! assert_eq!(exit_code, 0);
//! assert!(String::from_utf8(stdout).unwrap().starts_with("protomux "));
//! assert!(stderr.is_empty());
//! ```

use std::ffi::OsString;
use std::io::Write;

use clap::error::ErrorKind;

mod args;
mod echo;
mod error;
mod execution;

pub use echo::{DEFAULT_IDLE_TIMEOUT, EchoSession, MAX_LINE_LEN, line_echo};
pub use error::{CliError, EXIT_IO, EXIT_NEGOTIATION, EXIT_SUCCESS, EXIT_USAGE};

use args::{Mode, ParsedArgs, parse_args};

/// Maximum exit code representable by a Unix process.
const MAX_EXIT_CODE: i32 = u8::MAX as i32;

/// Deterministic help text describing the command-line surface.
const HELP_TEXT: &str = concat!(
    "protomux ",
    env!("CARGO_PKG_VERSION"),
    "\n",
    "\n",
    "Usage: protomux [-h] [-V] [-v...] [--timeout SECS] listen ADDR -p ID... [--once]\n",
    "           [--idle-timeout SECS]\n",
    "       protomux [-h] [-V] [-v...] [--timeout SECS] dial ADDR -p ID... [--message TEXT]\n",
    "       protomux [-h] [-V] [-v...] [--timeout SECS] dial ADDR --list\n",
    "\n",
    "Negotiates an application protocol over TCP with multistream-select and\n",
    "runs a line-echo session on the agreed protocol.\n",
    "\n",
    "Subcommands:\n",
    "  listen ADDR      Accept connections one at a time and echo lines.\n",
    "  dial ADDR        Connect, negotiate, and print the agreed protocol.\n",
    "\n",
    "Options:\n",
    "  -h, --help       Show this help message and exit.\n",
    "  -V, --version    Output version information and exit.\n",
    "  -v, --verbose    Increase logging verbosity; repeat for more detail.\n",
    "      --timeout=SECS  Negotiation deadline in seconds (default 60, 0 disables).\n",
    "  -p, --protocol=ID  Protocol identifier to register, in preference order.\n",
    "      --once       listen: exit after the first connection.\n",
    "      --idle-timeout=SECS  listen: close a silent session (default 60, 0 disables).\n",
    "  -m, --message=TEXT  dial: line to send after negotiation.\n",
    "      --list       dial: print the listener's protocols instead.\n",
    "\n",
    "Exit status is 0 on success, 1 for usage errors, 2 when negotiation\n",
    "fails, and 3 for connection or I/O failures. PROTOMUX_LOG overrides the\n",
    "log filter derived from -v.\n",
);

/// Renders the help text describing the supported options.
fn render_help() -> String {
    HELP_TEXT.to_string()
}

fn render_version() -> String {
    format!("protomux {}\n", env!("CARGO_PKG_VERSION"))
}

/// Runs the CLI using the provided argument iterator and output handles.
///
/// The function returns the process exit code that should be used by the
/// caller. On success, `0` is returned.
#[allow(clippy::module_name_repetitions)]
pub fn run<I, S, Out, Err>(arguments: I, stdout: &mut Out, stderr: &mut Err) -> i32
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
    Out: Write,
    Err: Write,
{
    match parse_args(arguments) {
        Ok(parsed) => execute(parsed, stdout, stderr),
        Err(error) => render_parse_error(&error, stdout, stderr),
    }
}

fn render_parse_error<Out, Err>(error: &clap::Error, stdout: &mut Out, stderr: &mut Err) -> i32
where
    Out: Write,
    Err: Write,
{
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            if write!(stdout, "{error}").is_err() {
                return EXIT_USAGE;
            }
            EXIT_SUCCESS
        }
        _ => {
            let _ = write!(stderr, "{error}");
            EXIT_USAGE
        }
    }
}

fn execute<Out, Err>(parsed: ParsedArgs, stdout: &mut Out, stderr: &mut Err) -> i32
where
    Out: Write,
    Err: Write,
{
    let ParsedArgs {
        show_help,
        show_version,
        verbose,
        timeout,
        mode,
    } = parsed;

    if show_help {
        if stdout.write_all(render_help().as_bytes()).is_err() {
            return EXIT_USAGE;
        }
        return EXIT_SUCCESS;
    }

    if show_version {
        if stdout.write_all(render_version().as_bytes()).is_err() {
            return EXIT_USAGE;
        }
        return EXIT_SUCCESS;
    }

    install_tracing(verbose, stderr);

    let outcome = match mode {
        Some(Mode::Listen(listen)) => execution::listen(&listen, timeout, stdout, stderr),
        Some(Mode::Dial(dial)) => execution::dial(&dial, timeout, stdout),
        None => Err(CliError::Usage(
            "a subcommand is required: 'listen' or 'dial'".to_owned(),
        )),
    };

    match outcome {
        Ok(()) => EXIT_SUCCESS,
        Err(error) => {
            let _ = writeln!(stderr, "protomux: {error}");
            error.exit_code()
        }
    }
}

#[cfg(feature = "tracing")]
fn install_tracing<Err: Write>(verbose: u8, stderr: &mut Err) {
    let config = logging::VerbosityConfig::from_verbose_level(verbose);
    match logging::init_tracing(&config) {
        Ok(()) | Err(logging::LoggingError::AlreadyInstalled(_)) => {}
        Err(error) => {
            let _ = writeln!(stderr, "protomux: {error}");
        }
    }
}

#[cfg(not(feature = "tracing"))]
fn install_tracing<Err: Write>(_verbose: u8, _stderr: &mut Err) {}

/// Converts a numeric exit code into an [`std::process::ExitCode`].
#[must_use]
pub fn exit_code_from(status: i32) -> std::process::ExitCode {
    std::process::ExitCode::from(clamp_exit_code(status))
}

fn clamp_exit_code(status: i32) -> u8 {
    u8::try_from(status.clamp(0, MAX_EXIT_CODE)).unwrap_or(u8::MAX)
}
