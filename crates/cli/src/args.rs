//! Command-line grammar for the `protomux` binary.

use std::ffi::OsString;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches, Command};
use protocol::{MAX_FRAME_LEN, Message};
use transport::DEFAULT_NEGOTIATE_TIMEOUT;

use crate::echo::DEFAULT_IDLE_TIMEOUT;

/// Parsed command produced by [`parse_args`].
#[derive(Debug, Default, Eq, PartialEq)]
pub(crate) struct ParsedArgs {
    pub(crate) show_help: bool,
    pub(crate) show_version: bool,
    pub(crate) verbose: u8,
    pub(crate) timeout: Duration,
    pub(crate) mode: Option<Mode>,
}

#[derive(Debug, Eq, PartialEq)]
pub(crate) enum Mode {
    Listen(ListenArgs),
    Dial(DialArgs),
}

#[derive(Debug, Eq, PartialEq)]
pub(crate) struct ListenArgs {
    pub(crate) address: String,
    pub(crate) protocols: Vec<String>,
    pub(crate) once: bool,
    pub(crate) idle: Duration,
}

#[derive(Debug, Eq, PartialEq)]
pub(crate) struct DialArgs {
    pub(crate) address: String,
    pub(crate) protocols: Vec<String>,
    pub(crate) message: Option<String>,
    pub(crate) list: bool,
}

fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .long("verbose")
        .short('v')
        .help("Increase logging verbosity; repeat for more detail.")
        .action(ArgAction::Count)
        .global(true)
}

fn timeout_arg() -> Arg {
    Arg::new("timeout")
        .long("timeout")
        .value_name("SECS")
        .help("Negotiation deadline in seconds (0 disables it).")
        .value_parser(parse_timeout)
        .global(true)
}

fn protocol_arg() -> Arg {
    Arg::new("protocol")
        .long("protocol")
        .short('p')
        .value_name("ID")
        .help("Protocol identifier to register, in preference order.")
        .value_parser(parse_protocol_id)
        .action(ArgAction::Append)
}

fn subcommand_help_arg() -> Arg {
    Arg::new("help")
        .long("help")
        .short('h')
        .help("Show help for this subcommand and exit.")
        .action(ArgAction::Help)
}

fn address_arg() -> Arg {
    Arg::new("address")
        .value_name("ADDR")
        .help("Socket address, for example 127.0.0.1:4001.")
        .required(true)
}

pub(crate) fn clap_command() -> Command {
    Command::new("protomux")
        .disable_help_flag(true)
        .disable_version_flag(true)
        .arg(
            Arg::new("help")
                .long("help")
                .short('h')
                .help("Show this help message and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .short('V')
                .help("Output version information and exit.")
                .action(ArgAction::SetTrue),
        )
        .arg(verbose_arg())
        .arg(timeout_arg())
        .subcommand(
            Command::new("listen")
                .about("Accept connections and echo lines on the negotiated protocol.")
                .disable_help_flag(true)
                .arg(subcommand_help_arg())
                .arg(address_arg())
                .arg(protocol_arg().required(true))
                .arg(
                    Arg::new("once")
                        .long("once")
                        .help("Exit after the first connection.")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("idle-timeout")
                        .long("idle-timeout")
                        .value_name("SECS")
                        .help("Close a session silent for this long (0 disables it).")
                        .value_parser(parse_timeout),
                ),
        )
        .subcommand(
            Command::new("dial")
                .about("Connect, negotiate, and optionally exchange one line.")
                .disable_help_flag(true)
                .arg(subcommand_help_arg())
                .arg(address_arg())
                .arg(protocol_arg().required_unless_present("list"))
                .arg(
                    Arg::new("message")
                        .long("message")
                        .short('m')
                        .value_name("TEXT")
                        .help("Line to send after negotiation.")
                        .value_parser(parse_message),
                )
                .arg(
                    Arg::new("list")
                        .long("list")
                        .help("Ask the listener for its protocols instead of negotiating.")
                        .action(ArgAction::SetTrue)
                        .conflicts_with("message"),
                ),
        )
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("'{value}' is not a number of seconds"))?;
    Duration::try_from_secs_f64(seconds)
        .map_err(|error| format!("invalid timeout '{value}': {error}"))
}

fn parse_protocol_id(value: &str) -> Result<String, String> {
    if value.is_empty() {
        return Err("protocol identifier must not be empty".to_owned());
    }
    if value.contains('\n') {
        return Err("protocol identifier must not contain a newline".to_owned());
    }
    if value.len() + 1 > MAX_FRAME_LEN {
        return Err(format!("protocol identifier exceeds {} bytes", MAX_FRAME_LEN - 1));
    }
    match Message::parse(value) {
        Message::Protocol(_) => Ok(value.to_owned()),
        _ => Err(format!("'{value}' is reserved by the handshake")),
    }
}

fn parse_message(value: &str) -> Result<String, String> {
    if value.contains('\n') {
        Err("message must be a single line".to_owned())
    } else {
        Ok(value.to_owned())
    }
}

fn protocols(matches: &ArgMatches) -> Vec<String> {
    matches
        .get_many::<String>("protocol")
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn address(matches: &ArgMatches) -> String {
    matches
        .get_one::<String>("address")
        .cloned()
        .unwrap_or_default()
}

/// Parses `arguments` (including the program name).
///
/// Help and version requests from a subcommand surface as clap errors of
/// kind [`ErrorKind::DisplayHelp`]; the caller prints those to stdout.
pub(crate) fn parse_args<I, S>(arguments: I) -> Result<ParsedArgs, clap::Error>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut args: Vec<OsString> = arguments.into_iter().map(Into::into).collect();
    if args.is_empty() {
        args.push(OsString::from("protomux"));
    }

    let mut command = clap_command();
    let matches = command.try_get_matches_from_mut(args)?;

    let show_help = matches.get_flag("help");
    let show_version = matches.get_flag("version");

    // Global arguments are visible from the innermost subcommand.
    let globals = matches
        .subcommand()
        .map_or(&matches, |(_, sub_matches)| sub_matches);
    let verbose = globals.get_count("verbose");
    let timeout = globals
        .get_one::<Duration>("timeout")
        .copied()
        .unwrap_or(DEFAULT_NEGOTIATE_TIMEOUT);

    let mode = match matches.subcommand() {
        Some(("listen", sub)) => Some(Mode::Listen(ListenArgs {
            address: address(sub),
            protocols: protocols(sub),
            once: sub.get_flag("once"),
            idle: sub
                .get_one::<Duration>("idle-timeout")
                .copied()
                .unwrap_or(DEFAULT_IDLE_TIMEOUT),
        })),
        Some(("dial", sub)) => Some(Mode::Dial(DialArgs {
            address: address(sub),
            protocols: protocols(sub),
            message: sub.get_one::<String>("message").cloned(),
            list: sub.get_flag("list"),
        })),
        _ => None,
    };

    if mode.is_none() && !show_help && !show_version {
        return Err(command.error(
            ErrorKind::MissingSubcommand,
            "a subcommand is required: 'listen' or 'dial'",
        ));
    }

    Ok(ParsedArgs {
        show_help,
        show_version,
        verbose,
        timeout,
        mode,
    })
}
