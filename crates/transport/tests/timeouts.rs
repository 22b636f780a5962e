//! Deadline behaviour against silent peers.

use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

use test_support::{PipeEnd, duplex};
use transport::{
    DeadlineStream, NegotiatingTransport, NegotiationError, NegotiatorConfig, Role, TransportError,
};

const BUDGET: Duration = Duration::from_millis(50);
const CEILING: Duration = Duration::from_millis(200);

fn passthrough<C: 'static>(config: NegotiatorConfig) -> NegotiatingTransport<C, C> {
    let negotiator = NegotiatingTransport::with_config(config);
    negotiator.add_transport(
        "/echo/1.0.0",
        |conn: C, _role: Role| -> Result<C, TransportError> { Ok(conn) },
    );
    negotiator
}

fn short_fused<C: 'static>() -> NegotiatingTransport<C, C> {
    passthrough(NegotiatorConfig::new().with_negotiate_timeout(BUDGET))
}

#[test]
fn initiating_side_times_out_against_silent_peer() {
    let negotiator = short_fused::<PipeEnd>();
    let (_silent, conn) = duplex();

    let started = Instant::now();
    let failure = negotiator
        .negotiate(conn, Role::Initiating)
        .expect_err("silent peer never sends its header");
    let elapsed = started.elapsed();

    assert!(elapsed < CEILING, "took {elapsed:?}");
    assert!(matches!(
        failure.error(),
        NegotiationError::TimedOut { role: Role::Initiating, timeout, .. } if *timeout == BUDGET
    ));
    let conn = failure.into_connection().expect("connection returned");
    assert_eq!(conn.deadline(), None);
    assert_eq!(conn.bytes_written(), 0);
}

#[test]
fn accepting_side_times_out_against_silent_peer() {
    let negotiator = short_fused::<PipeEnd>();
    let (_silent, conn) = duplex();

    let started = Instant::now();
    let failure = negotiator
        .negotiate(conn, Role::Accepting)
        .expect_err("silent peer never sends its header");

    assert!(started.elapsed() < CEILING);
    assert!(failure.error().is_timeout());
    let conn = failure.into_connection().expect("connection returned");
    assert_eq!(conn.deadline(), None);
    assert!(conn.bytes_written() > 0, "listener header goes out first");
}

#[test]
fn deadline_is_cleared_before_handoff() {
    let negotiator: NegotiatingTransport<PipeEnd, Option<Instant>> = NegotiatingTransport::new();
    negotiator.add_transport(
        "/echo/1.0.0",
        |conn: PipeEnd, _role: Role| -> Result<Option<Instant>, TransportError> {
            Ok(conn.deadline())
        },
    );
    let server = passthrough::<PipeEnd>(NegotiatorConfig::default());
    let (server_end, client_end) = duplex();

    std::thread::scope(|scope| {
        let accepted = scope.spawn(move || server.negotiate(server_end, Role::Accepting));
        let seen = negotiator
            .negotiate(client_end, Role::Initiating)
            .expect("client agrees");
        assert_eq!(seen, None);

        let server_conn = accepted.join().expect("server thread").expect("server agrees");
        assert_eq!(server_conn.deadline(), None);
    });
}

#[test]
fn tcp_dialer_times_out_against_silent_listener() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
    let socket = TcpStream::connect(listener.local_addr().expect("local addr")).expect("connect");
    let (_silent, _) = listener.accept().expect("accept");

    let negotiator = short_fused::<DeadlineStream<TcpStream>>();
    let started = Instant::now();
    let failure = negotiator
        .negotiate(DeadlineStream::new(socket), Role::Initiating)
        .expect_err("silent listener never sends its header");

    assert!(started.elapsed() < CEILING, "took {:?}", started.elapsed());
    assert!(failure.error().is_timeout());
    let conn = failure.into_connection().expect("connection returned");
    assert_eq!(conn.deadline(), None);
    assert_eq!(conn.get_ref().read_timeout().expect("query timeout"), None);
}
