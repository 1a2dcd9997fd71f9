use steplog::config::Settings;
use steplog::service::client;
use steplog::utils::logging;

#[tokio::main]
async fn main() {
    logging::setup_default_logging();

    let settings = Settings::load("steplog.toml").unwrap_or_default();
    let _ = client::run(&settings).await;
}
