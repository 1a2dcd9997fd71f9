//! Wire constants and runtime settings.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ExchangeError, Result};

/// Greeting sent to every client immediately after accept. The spelling
/// is part of the wire contract.
pub const GREETING: &str = "Wellcome!";

/// Probe sent at the head of each worker iteration.
pub const PROBE: &str = " Are you receiving this message?";

/// Size of the single-shot read buffer on both sides of the exchange.
/// Payloads larger than this are not reassembled.
pub const READ_BUFFER_SIZE: usize = 1024;

pub const DEFAULT_IP_ADDRESS: &str = "127.0.0.1";
pub const DEFAULT_SOCKET_PORT: u16 = 8080;

/// Runtime settings, read from a TOML file and/or `STEPLOG_*` environment
/// variables. The `IpAddress`/`SocketPort` key names are part of the
/// existing configuration contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "IpAddress", default = "default_ip_address")]
    pub ip_address: String,

    #[serde(rename = "SocketPort", default = "default_socket_port")]
    pub socket_port: u16,
}

fn default_ip_address() -> String {
    DEFAULT_IP_ADDRESS.to_string()
}

fn default_socket_port() -> u16 {
    DEFAULT_SOCKET_PORT
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ip_address: default_ip_address(),
            socket_port: default_socket_port(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ExchangeError::Config(format!("{}: {e}", path.as_ref().display()))
        })?;
        toml::from_str(&raw).map_err(|e| ExchangeError::Config(e.to_string()))
    }

    /// Defaults overridden by `STEPLOG_IP_ADDRESS` / `STEPLOG_SOCKET_PORT`.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Load from `path` if it exists, fall back to defaults otherwise,
    /// then apply environment overrides on top.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let base = if path.as_ref().exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        Ok(base.with_env_overrides())
    }

    /// Apply environment variable overrides. Unparseable values are
    /// ignored in favor of what is already set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(ip) = std::env::var("STEPLOG_IP_ADDRESS") {
            if !ip.is_empty() {
                self.ip_address = ip;
            }
        }
        if let Some(port) = std::env::var("STEPLOG_SOCKET_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            self.socket_port = port;
        }
        self
    }

    /// The `address:port` string the server binds and clients dial.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.ip_address, self.socket_port)
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = toml::to_string_pretty(self)
            .map_err(|e| ExchangeError::Config(e.to_string()))?;
        std::fs::write(path.as_ref(), raw).map_err(|e| {
            ExchangeError::Config(format!("{}: {e}", path.as_ref().display()))
        })
    }
}
