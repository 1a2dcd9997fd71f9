//! The logging sink: a six-level severity enumeration with a dispatch
//! onto `tracing`, plus subscriber initialization.
//!
//! Every component reports outcomes through this sink; it is safe for
//! concurrent use from all connection workers.

use std::fmt;
use std::str::FromStr;
use std::sync::{Once, OnceLock};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, registry, EnvFilter};

static INIT: Once = Once::new();

// Keeps the non-blocking file writer alive for the process lifetime.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Ordered severity levels: trace < debug < info < warn < error < fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        };
        f.write_str(name)
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "fatal" => Ok(LogLevel::Fatal),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

impl From<LogLevel> for Level {
    /// `tracing` has five levels; fatal folds into ERROR and stays
    /// distinguishable through the `fatal` event field.
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error | LogLevel::Fatal => Level::ERROR,
        }
    }
}

/// Emit a message at the given severity.
pub fn log_message(level: LogLevel, message: &str) {
    match level {
        LogLevel::Trace => tracing::trace!("{message}"),
        LogLevel::Debug => tracing::debug!("{message}"),
        LogLevel::Info => tracing::info!("{message}"),
        LogLevel::Warn => tracing::warn!("{message}"),
        LogLevel::Error => tracing::error!("{message}"),
        LogLevel::Fatal => tracing::error!(fatal = true, "{message}"),
    }
}

/// Emit a message with a single string parameter appended.
pub fn log_message_with(level: LogLevel, message: &str, param: &str) {
    match level {
        LogLevel::Trace => tracing::trace!("{message} - {param}"),
        LogLevel::Debug => tracing::debug!("{message} - {param}"),
        LogLevel::Info => tracing::info!("{message} - {param}"),
        LogLevel::Warn => tracing::warn!("{message} - {param}"),
        LogLevel::Error => tracing::error!("{message} - {param}"),
        LogLevel::Fatal => tracing::error!(fatal = true, "{message} - {param}"),
    }
}

/// Options for the logging subscriber.
#[derive(Clone, Debug)]
pub struct LogConfig {
    /// The name of the application, used for the filter and log files.
    pub app_name: String,
    /// Minimum severity to record.
    pub log_level: LogLevel,
    /// Directory where log files should be stored, None for console only.
    pub log_dir: Option<String>,
    /// Whether to log to stdout in addition to files.
    pub log_to_stdout: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            app_name: "steplog".to_string(),
            log_level: LogLevel::Info,
            log_dir: None,
            log_to_stdout: true,
        }
    }
}

/// Initialize the tracing subscriber with the given configuration.
/// Subsequent calls are no-ops.
pub fn init_logging(config: &LogConfig) {
    INIT.call_once(|| {
        let level: Level = config.log_level.into();
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{},{app_name}={level}",
                std::env::var("RUST_LOG").unwrap_or_default(),
                app_name = config.app_name,
            ))
        });

        let registry = registry().with(filter);

        match (&config.log_dir, config.log_to_stdout) {
            (Some(log_dir), true) => {
                let file_appender =
                    rolling::daily(log_dir, format!("{}.log", config.app_name));
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                let _ = FILE_GUARD.set(guard);

                let file_layer = subscriber_fmt::layer().with_writer(non_blocking);
                let stdout_layer = subscriber_fmt::layer()
                    .with_writer(std::io::stdout)
                    .with_ansi(true);

                registry.with(file_layer).with(stdout_layer).init();
            }
            (Some(log_dir), false) => {
                let file_appender =
                    rolling::daily(log_dir, format!("{}.log", config.app_name));
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                let _ = FILE_GUARD.set(guard);

                let file_layer = subscriber_fmt::layer().with_writer(non_blocking);
                registry.with(file_layer).init();
            }
            (None, _) => {
                let stdout_layer = subscriber_fmt::layer()
                    .with_writer(std::io::stdout)
                    .with_ansi(true);

                registry.with(stdout_layer).init();
            }
        }

        tracing::info!("Logging initialized at {} level", config.log_level);
    });
}

/// Setup default logging configuration for quick startup.
pub fn setup_default_logging() {
    init_logging(&LogConfig::default());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered_by_severity() {
        assert!(LogLevel::Trace < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Fatal);
    }

    #[test]
    fn parses_level_names_case_insensitively() {
        assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("fatal".parse::<LogLevel>().unwrap(), LogLevel::Fatal);
        assert!("loud".parse::<LogLevel>().is_err());
    }
}
