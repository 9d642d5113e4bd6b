//! Configuration types module
//!
//! Splits the bridge configuration into focused pieces:
//! - target.rs: traffic generator targets and their port mappings
//! - connection.rs: HTTP session and retry policy for targets

pub mod connection;
pub mod target;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Traffic generator targets keyed by name
    #[serde(default)]
    pub targets: BTreeMap<String, target::TargetConfig>,

    /// MCP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Retry policy for OTG calls
    #[serde(default)]
    pub retry: connection::RetryConfig,

    /// HTTP session settings for OTG calls
    #[serde(default)]
    pub connection: connection::ConnectionConfig,

    /// Extra directory searched for `<version>/openapi.yaml` schemas
    #[serde(default)]
    pub schema_dir: Option<PathBuf>,
}

impl Config {
    /// Configuration used when no config file is available.
    ///
    /// Provides a single development target so the server is usable
    /// out of the box against a local controller.
    pub fn development() -> Self {
        let mut config = Config::default();
        let target = target::TargetConfig::development(&config.connection);
        config.targets.insert(target.name.clone(), target);
        config
    }

    /// Names of all configured targets
    pub fn target_names(&self) -> Vec<&str> {
        self.targets.keys().map(|s| s.as_str()).collect()
    }
}

/// Transport used to talk to the MCP client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    /// Newline-delimited JSON-RPC over standard in/out
    #[default]
    Stdio,
    /// JSON-RPC over HTTP POST
    Http,
}

impl std::str::FromStr for TransportMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "stdio" => Ok(TransportMode::Stdio),
            "http" | "sse" | "streamable-http" => Ok(TransportMode::Http),
            _ => Err(Error::Config(format!(
                "Invalid transport: {}. Valid options: stdio, http",
                s
            ))),
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportMode::Stdio => write!(f, "stdio"),
            TransportMode::Http => write!(f, "http"),
        }
    }
}

/// MCP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Transport mode
    #[serde(default)]
    pub transport: TransportMode,
    /// Bind address for the HTTP transport
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Port for the HTTP transport
    #[serde(default = "default_port")]
    pub port: u16,
    /// Log level filter
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            transport: TransportMode::default(),
            bind: default_bind(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Log levels accepted by `server.log_level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Normalize and check a log level name
pub fn parse_log_level(level: &str) -> Result<String> {
    let lower = level.trim().to_lowercase();
    let lower = match lower.as_str() {
        "warning" => "warn".to_string(),
        "critical" => "error".to_string(),
        _ => lower,
    };
    if LOG_LEVELS.contains(&lower.as_str()) {
        Ok(lower)
    } else {
        Err(Error::Config(format!(
            "Log level must be one of {:?}, got '{}'",
            LOG_LEVELS, level
        )))
    }
}
