//! The listening daemon.
//!
//! Binds the configured address, accepts connections in a loop and hands
//! each one to its own [`ConnectionWorker`] task. Per-connection failures
//! are contained to their iteration; only an error from the accept call
//! itself ends the listening loop. Shutdown closes the listener, signals
//! all in-flight workers and waits for them to drain within a bounded
//! window.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, error, info, instrument, warn};

use crate::config::{Settings, GREETING};
use crate::error::{ExchangeError, Result};
use crate::service::worker::ConnectionWorker;
use crate::utils::timeout::{DRAIN_POLL_INTERVAL, SHUTDOWN_TIMEOUT};

/// A bound, not-yet-running server.
pub struct Daemon {
    listener: TcpListener,
    local_addr: SocketAddr,
    stop_tx: watch::Sender<bool>,
    active: Arc<Mutex<u32>>,
}

impl Daemon {
    /// Bind the listening socket. Address contention is reported as
    /// [`ExchangeError::AlreadyListening`] so callers can tell another
    /// running instance apart from unrelated startup failures.
    pub async fn bind(settings: &Settings) -> Result<Self> {
        let addr = settings.addr();
        let listener = TcpListener::bind(&addr).await.map_err(|e| match e.kind() {
            io::ErrorKind::AddrInUse | io::ErrorKind::PermissionDenied => {
                ExchangeError::AlreadyListening(addr.clone())
            }
            _ => ExchangeError::Io(e),
        })?;
        let local_addr = listener.local_addr()?;
        let (stop_tx, _) = watch::channel(false);

        Ok(Self {
            listener,
            local_addr,
            stop_tx,
            active: Arc::new(Mutex::new(0u32)),
        })
    }

    /// The address the listener actually bound (useful with port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until a shutdown signal arrives or the accept
    /// call itself fails. Returning drops the listener either way.
    #[instrument(skip(self, shutdown_rx), fields(address = %self.local_addr))]
    pub async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        info!("Server is running");

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Shutting down server. Waiting for connections to close...");
                    let _ = self.stop_tx.send(true);
                    self.drain().await;
                    return Ok(());
                }

                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, peer)) => self.launch_worker(stream, peer).await,
                        Err(e) => {
                            error!(error = %e, "Server error while accepting");
                            return Err(e.into());
                        }
                    }
                }
            }
        }
    }

    /// Greet the new client and spawn its worker. Failures here abort
    /// this connection only; the accept loop keeps going.
    async fn launch_worker(&self, mut stream: TcpStream, peer: SocketAddr) {
        info!(peer = %peer, "Client connected");

        if let Err(e) = stream.write_all(GREETING.as_bytes()).await {
            error!(error = %e, peer = %peer, "Unable to send greeting");
            return;
        }
        info!(peer = %peer, "Server message sent");

        {
            let mut count = self.active.lock().await;
            *count += 1;
        }

        let worker = ConnectionWorker::new(stream, peer, self.stop_tx.subscribe());
        let active = Arc::clone(&self.active);
        tokio::spawn(async move {
            worker.run().await;
            let mut count = active.lock().await;
            *count -= 1;
            info!(peer = %peer, "Connection closed");
        });
    }

    /// Wait for active workers to finish, up to the shutdown timeout.
    async fn drain(&self) {
        let timeout = tokio::time::sleep(SHUTDOWN_TIMEOUT);
        tokio::pin!(timeout);

        loop {
            tokio::select! {
                _ = &mut timeout => {
                    warn!("Shutdown timeout reached, forcing exit");
                    break;
                }
                _ = tokio::time::sleep(DRAIN_POLL_INTERVAL) => {
                    let connections = *self.active.lock().await;
                    if connections == 0 {
                        info!("All connections closed, shutting down");
                        break;
                    }
                    debug!(connections, "Waiting for connections to close");
                }
            }
        }
    }
}

/// Start a server and listen for connections until ctrl-c.
pub async fn start(settings: &Settings) -> Result<()> {
    let daemon = Daemon::bind(settings).await?;

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, initiating graceful shutdown");
            let _ = shutdown_tx.send(()).await;
        }
    });

    daemon.run(shutdown_rx).await
}

/// Start a server whose shutdown is driven by the given channel instead
/// of process signals.
pub async fn start_with_shutdown(
    settings: &Settings,
    shutdown_rx: mpsc::Receiver<()>,
) -> Result<()> {
    Daemon::bind(settings).await?.run(shutdown_rx).await
}
