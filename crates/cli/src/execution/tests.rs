use super::*;

use std::io::Read;
use std::thread;

const CHAT: &str = "/chat/1.0.0";
const ECHO: &str = "/echo/1.0.0";
const TIMEOUT: Duration = Duration::from_secs(5);
const IDLE: Duration = Duration::from_secs(5);

fn ids(protocols: &[&str]) -> Vec<String> {
    protocols.iter().map(|&id| id.to_owned()).collect()
}

fn dial_args(address: SocketAddr, protocols: &[&str]) -> DialArgs {
    DialArgs {
        address: address.to_string(),
        protocols: ids(protocols),
        message: None,
        list: false,
    }
}

/// Serves exactly one connection on a loopback port.
fn spawn_server(
    protocols: &[&str],
) -> (
    SocketAddr,
    thread::JoinHandle<(Result<(), CliError>, String, String)>,
) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let address = listener.local_addr().expect("local address");
    let negotiator = build_negotiator(&ids(protocols), TIMEOUT);
    let handle = thread::spawn(move || {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let outcome = serve_connections(&listener, &negotiator, true, IDLE, &mut stdout, &mut stderr);
        (
            outcome,
            String::from_utf8(stdout).expect("utf-8 stdout"),
            String::from_utf8(stderr).expect("utf-8 stderr"),
        )
    });
    (address, handle)
}

#[test]
fn dial_negotiates_and_echoes_message() {
    let (address, server) = spawn_server(&[ECHO, CHAT]);

    let mut args = dial_args(address, &[CHAT, ECHO]);
    args.message = Some("hello there".to_owned());
    let mut stdout = Vec::new();
    dial(&args, TIMEOUT, &mut stdout).expect("dial succeeds");
    assert_eq!(
        String::from_utf8(stdout).expect("utf-8"),
        "negotiated /chat/1.0.0\nhello there\n"
    );

    let (outcome, server_out, server_err) = server.join().expect("server thread");
    outcome.expect("server succeeds");
    assert!(server_out.contains("negotiated /chat/1.0.0"), "{server_out}");
    assert!(server_out.contains("closed after 1 lines"), "{server_out}");
    assert!(server_err.is_empty());
}

#[test]
fn dial_falls_back_to_later_preference() {
    let (address, server) = spawn_server(&[ECHO]);

    let mut stdout = Vec::new();
    dial(&dial_args(address, &[CHAT, ECHO]), TIMEOUT, &mut stdout).expect("dial succeeds");
    assert_eq!(String::from_utf8(stdout).expect("utf-8"), "negotiated /echo/1.0.0\n");

    let (outcome, _, _) = server.join().expect("server thread");
    outcome.expect("server succeeds");
}

#[test]
fn disjoint_protocols_fail_on_both_sides() {
    let (address, server) = spawn_server(&["/b/1"]);

    let mut stdout = Vec::new();
    let error = dial(&dial_args(address, &["/a/1"]), TIMEOUT, &mut stdout)
        .expect_err("no common protocol");
    assert!(matches!(&error, CliError::Negotiation(inner) if inner.is_no_agreement()));
    assert_eq!(error.exit_code(), crate::error::EXIT_NEGOTIATION);
    assert!(stdout.is_empty());

    let (outcome, _, _) = server.join().expect("server thread");
    let error = outcome.expect_err("server fails too");
    assert!(matches!(&error, CliError::Negotiation(inner) if inner.is_no_agreement()));
}

#[test]
fn list_prints_listener_protocols() {
    let (address, server) = spawn_server(&[ECHO, CHAT]);

    let mut args = dial_args(address, &[]);
    args.list = true;
    let mut stdout = Vec::new();
    dial(&args, TIMEOUT, &mut stdout).expect("listing succeeds");
    assert_eq!(
        String::from_utf8(stdout).expect("utf-8"),
        "/echo/1.0.0\n/chat/1.0.0\n"
    );

    // The listener sees the peer leave without proposing anything.
    let (outcome, _, _) = server.join().expect("server thread");
    assert!(matches!(outcome, Err(CliError::Negotiation(_))));
}

#[test]
fn silent_listener_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let address = listener.local_addr().expect("local address");
    let holder = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut sink = Vec::new();
        let _ = stream.read_to_end(&mut sink);
    });

    let mut stdout = Vec::new();
    let error = dial(
        &dial_args(address, &[ECHO]),
        Duration::from_millis(100),
        &mut stdout,
    )
    .expect_err("listener never answers");
    assert!(matches!(&error, CliError::Negotiation(inner) if inner.is_timeout()));
    holder.join().expect("holder thread");
}

#[test]
fn refused_connection_is_an_io_failure() {
    let address = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        listener.local_addr().expect("local address")
    };

    let mut stdout = Vec::new();
    let error = dial(&dial_args(address, &[ECHO]), TIMEOUT, &mut stdout)
        .expect_err("nothing listening");
    assert_eq!(error.exit_code(), crate::error::EXIT_IO);
    assert!(error.to_string().starts_with(&format!("connect to {address}")));
}

#[test]
fn failed_connection_does_not_stop_the_listener() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let address = listener.local_addr().expect("local address");
    let negotiator = build_negotiator(&ids(&[ECHO]), TIMEOUT);

    let client = thread::spawn(move || {
        let mut stdout = Vec::new();
        let first = dial(&dial_args(address, &[CHAT]), TIMEOUT, &mut stdout);
        let second = dial(&dial_args(address, &[ECHO]), TIMEOUT, &mut stdout);
        (first.is_err(), second.is_ok())
    });

    // Serve the failing connection, then the successful one.
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let (stream, peer) = listener.accept().expect("accept first");
    let first = serve_one(&negotiator, stream, peer, IDLE, &mut stdout);
    assert!(first.is_err());
    serve_connections(&listener, &negotiator, true, IDLE, &mut stdout, &mut stderr)
        .expect("second connection succeeds");

    assert_eq!(client.join().expect("client thread"), (true, true));
    let stdout = String::from_utf8(stdout).expect("utf-8");
    assert!(stdout.contains("negotiated /echo/1.0.0"), "{stdout}");
}

#[test]
fn silent_session_is_closed_after_idle_timeout() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let address = listener.local_addr().expect("local address");
    let negotiator = build_negotiator(&ids(&[ECHO]), TIMEOUT);

    let client = thread::spawn(move || {
        let stream = TcpStream::connect(address).expect("connect");
        let session = build_negotiator(&ids(&[ECHO]), TIMEOUT)
            .negotiate(DeadlineStream::new(stream), Role::Initiating)
            .expect("negotiation succeeds");
        // Stay connected without sending until the listener hangs up.
        let mut conn = session.into_inner();
        let mut sink = Vec::new();
        conn.read_to_end(&mut sink).map(|_| sink.len())
    });

    let mut stdout = Vec::new();
    let (stream, peer) = listener.accept().expect("accept");
    let error = serve_one(&negotiator, stream, peer, Duration::from_millis(100), &mut stdout)
        .expect_err("idle session is closed");
    assert!(
        matches!(&error, CliError::Io { source, .. } if source.kind() == io::ErrorKind::TimedOut),
        "{error:?}"
    );
    assert_eq!(error.exit_code(), crate::error::EXIT_IO);
    assert!(String::from_utf8(stdout).expect("utf-8").contains("negotiated /echo/1.0.0"));

    assert_eq!(client.join().expect("client thread").expect("peer closed"), 0);
}
