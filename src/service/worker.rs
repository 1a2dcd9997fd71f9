//! Per-connection worker.
//!
//! Each accepted connection is owned by exactly one worker task. The
//! worker keeps a private read buffer and shares nothing with other
//! workers beyond the logging sink.

use std::io;
use std::net::SocketAddr;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument};

use crate::config::{PROBE, READ_BUFFER_SIZE};
use crate::core::codec;

/// Runs the conversation with one connected client: send the probe
/// message, read at most one buffer's worth of bytes, decode them as a
/// step-list document and log the records in order.
///
/// A payload larger than the buffer, or split across TCP segments, is
/// not reassembled; it fails decode on this iteration and the peer may
/// try again on the next.
pub struct ConnectionWorker {
    stream: TcpStream,
    peer: SocketAddr,
    buf: BytesMut,
    shutdown: watch::Receiver<bool>,
}

impl ConnectionWorker {
    pub fn new(stream: TcpStream, peer: SocketAddr, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            stream,
            peer,
            buf: BytesMut::zeroed(READ_BUFFER_SIZE),
            shutdown,
        }
    }

    /// Drive the conversation until the peer disconnects or the process
    /// shuts down. Decode failures and transient I/O errors are logged
    /// and the loop continues.
    #[instrument(skip(self), fields(peer = %self.peer))]
    pub async fn run(mut self) {
        let mut connected = true;
        while connected {
            if let Err(e) = self.stream.write_all(PROBE.as_bytes()).await {
                if is_disconnect(&e) {
                    info!("Client disconnected");
                    connected = false;
                } else {
                    error!(error = %e, "Unable to send message to client");
                }
                continue;
            }

            // One read call per iteration, up to the fixed buffer size.
            let n = tokio::select! {
                _ = stop_requested(&mut self.shutdown) => {
                    debug!("Worker stopping for shutdown");
                    break;
                }
                read = self.stream.read(&mut self.buf[..]) => match read {
                    Ok(0) => {
                        info!("Client disconnected");
                        connected = false;
                        continue;
                    }
                    Ok(n) => n,
                    Err(e) => {
                        error!(error = %e, "IOException while reading from client");
                        if is_disconnect(&e) {
                            connected = false;
                        }
                        continue;
                    }
                }
            };

            debug!(bytes = n, "Client sent message");
            match codec::decode(&self.buf[..n]) {
                Ok(list) => {
                    info!(steps = list.len(), "Step list received");
                    for (i, step) in list.iter().enumerate() {
                        info!("{}. {}", i + 1, step);
                    }
                }
                Err(e) => {
                    error!(error = %e, "Unable to decode client message");
                }
            }
        }
    }
}

/// Completes only on an explicit stop signal. A dropped sender means no
/// further signals can arrive, so the worker keeps serving its peer.
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    if shutdown.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Errors that mean the peer is gone rather than a transient fault.
fn is_disconnect(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
            | io::ErrorKind::UnexpectedEof
    )
}
