use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use steplog::config::{Settings, GREETING};
use steplog::error::Result;
use steplog::service::daemon::Daemon;
use steplog::utils::timeout::with_timeout;

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
async fn graceful_shutdown_stops_listener_and_workers() {
    let (addr, shutdown_tx, handle) = spawn_daemon().await;

    // An in-flight connection with an idle worker.
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let mut greeting = vec![0u8; GREETING.len()];
    stream.read_exact(&mut greeting).await.unwrap();
    assert_eq!(greeting, GREETING.as_bytes());

    shutdown_tx.send(()).await.unwrap();

    let outcome = with_timeout(handle, Duration::from_secs(5))
        .await
        .expect("server did not shut down in time")
        .expect("server task panicked");
    assert!(outcome.is_ok());

    // The worker was signalled: after any buffered probe bytes the
    // stream reaches end-of-file.
    let mut buf = [0u8; 64];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => continue,
        }
    }

    // The listening socket is gone; a fresh dial is refused or closed
    // immediately without a greeting.
    match TcpStream::connect(addr).await {
        Err(_) => {}
        Ok(mut late) => {
            let n = late.read(&mut buf).await.unwrap_or(0);
            assert_eq!(n, 0, "no server should be greeting new connections");
        }
    }
}

#[tokio::test]
async fn shutdown_with_no_connections_is_immediate() {
    let (_addr, shutdown_tx, handle) = spawn_daemon().await;

    shutdown_tx.send(()).await.unwrap();

    let outcome = with_timeout(handle, Duration::from_secs(5))
        .await
        .expect("server did not shut down in time")
        .expect("server task panicked");
    assert!(outcome.is_ok());
}
