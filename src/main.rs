//! Process entry point: starts the server, one immediate client and one
//! delayed client, then runs until ctrl-c.

use std::process::ExitCode;

use tokio::sync::mpsc;
use tokio::time;
use tracing::{error, info};

use steplog::config::Settings;
use steplog::error::ExchangeError;
use steplog::service::{client, daemon};
use steplog::utils::logging::{self, LogLevel};
use steplog::utils::timeout::DELAYED_CLIENT_START;

const CONFIG_PATH: &str = "steplog.toml";

#[tokio::main]
async fn main() -> ExitCode {
    logging::setup_default_logging();

    let settings = match Settings::load(CONFIG_PATH) {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, "Unable to load settings");
            return ExitCode::from(1);
        }
    };

    let daemon = match daemon::Daemon::bind(&settings).await {
        Ok(daemon) => daemon,
        Err(ExchangeError::AlreadyListening(addr)) => {
            logging::log_message_with(LogLevel::Debug, "Server is already running", &addr);
            return ExitCode::from(2);
        }
        Err(e) => {
            logging::log_message_with(LogLevel::Error, "Server error", &e.to_string());
            return ExitCode::from(1);
        }
    };

    logging::log_message(LogLevel::Info, "Server is running");

    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, initiating graceful shutdown");
            let _ = shutdown_tx.send(()).await;
        }
    });

    let server = tokio::spawn(daemon.run(shutdown_rx));

    // One client right away, a second one on a fixed delay. Both log
    // their own outcomes; neither blocks the server or each other.
    let first = settings.clone();
    tokio::spawn(async move {
        let _ = client::run(&first).await;
    });

    let second = settings;
    tokio::spawn(async move {
        time::sleep(DELAYED_CLIENT_START).await;
        let _ = client::run(&second).await;
    });

    match server.await {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            error!(error = %e, "Server terminated abnormally");
            ExitCode::from(1)
        }
        Err(e) => {
            error!(error = %e, "Server task panicked");
            ExitCode::from(1)
        }
    }
}
