//! The demonstration client.
//!
//! Dials the server, reads the greeting in a single fixed-size read,
//! answers with one encoded step list, lingers briefly and disconnects.
//! There is no retry: a failed dial aborts the session.

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time;
use tracing::{error, info, instrument, warn};

use crate::config::{Settings, READ_BUFFER_SIZE};
use crate::core::codec;
use crate::core::step::{StepList, StepRecord};
use crate::error::{ExchangeError, Result};
use crate::utils::timeout::LINGER_DELAY;

/// What a client session observed, for callers that want to assert on
/// the conversation.
#[derive(Debug)]
pub struct SessionOutcome {
    /// Whatever the first read returned, lossily decoded.
    pub greeting: String,
    /// Number of records sent (zero when the greeting was empty or the
    /// send failed).
    pub steps_sent: usize,
    /// Whether the connection ended up closed after the linger.
    pub disconnected: bool,
}

/// The fixed demonstration payload: four distinct records, each sent
/// twice, in this exact order.
pub fn demo_payload() -> StepList {
    let e1 = StepRecord::new("1", "one");
    let e2 = StepRecord::new("2", "two");
    let e3 = StepRecord::new("3", "three");
    let e4 = StepRecord::new("4", "four");

    StepList::from(vec![
        e1.clone(),
        e2.clone(),
        e3.clone(),
        e4.clone(),
        e1,
        e2,
        e3,
        e4,
    ])
}

/// Run one client session against the configured server.
///
/// The greeting read and the payload send are each contained: a failure
/// there is logged and the session still proceeds to the linger and
/// disconnect phase. Only the dial itself is fatal to the session.
#[instrument(skip(settings), fields(address = %settings.addr()))]
pub async fn run(settings: &Settings) -> Result<SessionOutcome> {
    let addr = settings.addr();
    info!("Connecting...");

    let mut stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            error!(error = %e, "Unable to connect the client");
            return Err(ExchangeError::Connect { addr, source: e });
        }
    };
    let peer = stream
        .peer_addr()
        .map(|p| p.to_string())
        .unwrap_or_else(|_| addr.clone());
    info!(peer = %peer, "Connected");

    let mut greeting = String::new();
    let mut steps_sent = 0;
    let mut buf = BytesMut::zeroed(READ_BUFFER_SIZE);

    // Single read for the greeting; whatever arrived by now is all we
    // look at.
    match stream.read(&mut buf[..]).await {
        Ok(n) => {
            greeting = String::from_utf8_lossy(&buf[..n]).to_string();
            info!(message = %greeting, "Server sent message");

            if n != 0 {
                let payload = demo_payload();
                let bytes = codec::encode(&payload);
                match stream.write_all(&bytes).await {
                    Ok(()) => {
                        steps_sent = payload.len();
                        info!(peer = %peer, "Collection was sent by client");
                    }
                    Err(e) => error!(error = %e, "Unable to send collection"),
                }
            }
        }
        Err(e) => error!(error = %e, "Unable to read server message"),
    }

    time::sleep(LINGER_DELAY).await;

    let disconnected = stream.shutdown().await.is_ok();
    if disconnected {
        info!(peer = %peer, "Client disconnected");
    } else {
        warn!(peer = %peer, "The underlying TCP connection was not closed by client");
    }

    Ok(SessionOutcome {
        greeting,
        steps_sent,
        disconnected,
    })
}
