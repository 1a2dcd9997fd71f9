use std::net::SocketAddr;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use steplog::config::{Settings, GREETING};
use steplog::error::{ExchangeError, Result};
use steplog::service::client;
use steplog::service::daemon::Daemon;

async fn spawn_daemon() -> (SocketAddr, mpsc::Sender<()>, JoinHandle<Result<()>>) {
    let settings = Settings {
        ip_address: "127.0.0.1".to_string(),
        socket_port: 0,
    };
    let daemon = Daemon::bind(&settings).await.expect("bind failed");
    let addr = daemon.local_addr();
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let handle = tokio::spawn(daemon.run(shutdown_rx));
    (addr, shutdown_tx, handle)
}

#[tokio::test]
async fn full_session_ends_disconnected() {
    let (addr, _shutdown_tx, _handle) = spawn_daemon().await;

    let settings = Settings {
        ip_address: "127.0.0.1".to_string(),
        socket_port: addr.port(),
    };
    let outcome = client::run(&settings).await.expect("session failed");

    // The first read may also pick up the worker's probe right behind
    // the greeting; the greeting itself always leads.
    assert!(outcome.greeting.starts_with(GREETING));
    assert_eq!(outcome.steps_sent, 8);
    assert!(outcome.disconnected, "session should end disconnected");
}

#[tokio::test]
async fn dial_failure_aborts_the_session() {
    // An ephemeral port that nothing listens on: bind one, note it,
    // drop it.
    let probe = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_port = probe.local_addr().unwrap().port();
    drop(probe);

    let settings = Settings {
        ip_address: "127.0.0.1".to_string(),
        socket_port: dead_port,
    };
    match client::run(&settings).await {
        Err(ExchangeError::Connect { addr, .. }) => {
            assert_eq!(addr, settings.addr());
        }
        Err(other) => panic!("expected Connect error, got {other}"),
        Ok(_) => panic!("dialing a dead port should fail"),
    }
}
