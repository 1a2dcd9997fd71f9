use std::process::ExitCode;

use steplog::config::Settings;
use steplog::error::ExchangeError;
use steplog::service::daemon;
use steplog::utils::logging;

#[tokio::main]
async fn main() -> ExitCode {
    logging::setup_default_logging();

    let settings = Settings::load("steplog.toml").unwrap_or_default();
    match daemon::start(&settings).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(ExchangeError::AlreadyListening(_)) => ExitCode::from(2),
        Err(_) => ExitCode::from(1),
    }
}
