//! Drives `cli::run` against real loopback sockets.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use cli::{EXIT_IO, EXIT_NEGOTIATION, EXIT_SUCCESS, EchoSession, line_echo};
use transport::{DeadlineStream, NegotiatingTransport, Role};

type Conn = DeadlineStream<TcpStream>;

fn run(args: &[&str]) -> (i32, String, String) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let code = cli::run(args.iter().copied(), &mut stdout, &mut stderr);
    (
        code,
        String::from_utf8(stdout).expect("utf-8 stdout"),
        String::from_utf8(stderr).expect("utf-8 stderr"),
    )
}

/// Accepts one connection with a library-built negotiator and echoes on it.
fn library_server(protocols: &[&'static str]) -> (SocketAddr, thread::JoinHandle<Option<u64>>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let address = listener.local_addr().expect("local address");
    let negotiator: NegotiatingTransport<Conn, EchoSession<Conn>> = NegotiatingTransport::new();
    for &protocol in protocols {
        negotiator.add_transport(protocol, line_echo::<Conn>(protocol));
    }
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().ok()?;
        let session = negotiator
            .negotiate(DeadlineStream::new(stream), Role::Accepting)
            .ok()?;
        session.serve().ok()
    });
    (address, handle)
}

fn free_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    listener.local_addr().expect("local address")
}

fn wait_until_listening(address: SocketAddr) {
    let started = Instant::now();
    while TcpStream::connect(address).is_err() {
        assert!(
            started.elapsed() < Duration::from_secs(5),
            "listener never came up on {address}"
        );
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn dial_talks_to_a_library_listener() {
    let (address, server) = library_server(&["/echo/1.0.0", "/chat/1.0.0"]);
    let address = address.to_string();

    let (code, stdout, stderr) = run(&[
        "protomux",
        "dial",
        &address,
        "-p",
        "/chat/1.0.0",
        "--message",
        "ping",
    ]);
    assert_eq!(code, EXIT_SUCCESS, "{stderr}");
    assert_eq!(stdout, "negotiated /chat/1.0.0\nping\n");
    assert_eq!(server.join().expect("server thread"), Some(1));
}

#[test]
fn dial_reports_negotiation_failure_exit_code() {
    let (address, server) = library_server(&["/echo/1.0.0"]);
    let address = address.to_string();

    let (code, stdout, stderr) = run(&["protomux", "dial", &address, "-p", "/chat/1.0.0"]);
    assert_eq!(code, EXIT_NEGOTIATION);
    assert!(stdout.is_empty());
    assert!(stderr.starts_with("protomux: negotiation failed"), "{stderr}");
    assert_eq!(server.join().expect("server thread"), None);
}

#[test]
fn dial_to_closed_port_is_an_io_failure() {
    let address = free_port().to_string();
    let (code, _, stderr) = run(&["protomux", "--timeout", "2", "dial", &address, "-p", "/a"]);
    assert_eq!(code, EXIT_IO);
    assert!(stderr.contains("connect to"), "{stderr}");
}

#[test]
fn listen_once_serves_a_single_dialer() {
    let address = free_port();
    let bind = address.to_string();
    let listener = thread::spawn(move || {
        run(&[
            "protomux",
            "listen",
            &bind,
            "-p",
            "/echo/1.0.0",
            "-p",
            "/chat/1.0.0",
            "--once",
        ])
    });
    wait_until_listening(address);

    // The readiness probe above is the first connection; it closes without
    // proposing, so `--once` reports its failure.
    let (code, stdout, stderr) = listener.join().expect("listener thread");
    assert_eq!(code, EXIT_NEGOTIATION, "{stderr}");
    assert!(stdout.starts_with(&format!("listening on {address}")), "{stdout}");
}

#[test]
fn listen_keeps_serving_after_a_failed_connection() {
    let address = free_port();
    let bind = address.to_string();
    thread::spawn(move || run(&["protomux", "listen", &bind, "-p", "/echo/1.0.0"]));
    wait_until_listening(address);

    let target = address.to_string();
    let (code, stdout, stderr) = run(&[
        "protomux",
        "dial",
        &target,
        "-p",
        "/chat/1.0.0",
        "-p",
        "/echo/1.0.0",
        "-m",
        "still here",
    ]);
    assert_eq!(code, EXIT_SUCCESS, "{stderr}");
    assert_eq!(stdout, "negotiated /echo/1.0.0\nstill here\n");
}

#[test]
fn list_prints_what_the_listener_supports() {
    let (address, _server) = library_server(&["/echo/1.0.0", "/chat/1.0.0"]);
    let address = address.to_string();

    let (code, stdout, stderr) = run(&["protomux", "dial", &address, "--list"]);
    assert_eq!(code, EXIT_SUCCESS, "{stderr}");
    assert_eq!(stdout, "/echo/1.0.0\n/chat/1.0.0\n");
}
