use std::time::Duration;
use tokio::time;

/// How long a client keeps its connection open after sending the payload.
pub const LINGER_DELAY: Duration = Duration::from_secs(5);

/// Delay before the orchestrator launches its second client.
pub const DELAYED_CLIENT_START: Duration = Duration::from_secs(8);

/// Maximum time the daemon waits for workers to drain on shutdown.
pub const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Poll interval while waiting for active connections to close.
pub const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Wrap an async operation with a timeout.
pub async fn with_timeout<T>(
    operation: impl std::future::Future<Output = T>,
    duration: Duration,
) -> std::result::Result<T, time::error::Elapsed> {
    time::timeout(duration, operation).await
}
