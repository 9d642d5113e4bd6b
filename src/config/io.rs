//! Configuration I/O - Loading configuration
//!
//! Handles reading the target file and environment variable overrides.

use serde_json::Value;
use std::path::Path;
use tracing::{error, info, warn};

use super::types::target::TargetConfig;
use super::types::{parse_log_level, Config};
use crate::error::{Error, Result};

/// Load configuration with layered precedence:
/// 1. Explicit config file, or the default config path if it exists
/// 2. The development target when neither is available
/// 3. Environment variable overrides (includes .env)
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let mut config = match explicit {
        Some(path) => {
            info!("Loading configuration from file: {}", path.display());
            load_config_from_path(path)?
        }
        None => {
            let default_path = super::paths::config_path();
            if default_path.exists() {
                info!("Loading configuration from {}", default_path.display());
                load_config_from_path(&default_path)?
            } else {
                info!("No targets defined - adding default development target");
                Config::development()
            }
        }
    };

    apply_env_overrides(&mut config)?;

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    parse_config(&content)
}

/// Parse the content of a config file.
///
/// Server, retry and connection sections deserialize strictly. Targets are
/// processed one by one; a malformed target is logged and skipped.
pub fn parse_config(content: &str) -> Result<Config> {
    let raw: Value = json5::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid JSON in configuration file: {}", e)))?;

    let root = raw
        .as_object()
        .ok_or_else(|| Error::Config("Configuration file must contain a JSON object".to_string()))?;

    let targets = root
        .get("targets")
        .ok_or_else(|| {
            Error::Config("Configuration file must contain a 'targets' property".to_string())
        })?
        .as_object()
        .ok_or_else(|| Error::Config("'targets' must be an object".to_string()))?;

    let mut config = Config::default();

    if let Some(server) = root.get("server") {
        config.server = serde_json::from_value(server.clone())
            .map_err(|e| Error::Config(format!("Invalid 'server' section: {}", e)))?;
    }
    if let Some(retry) = root.get("retry") {
        config.retry = serde_json::from_value(retry.clone())
            .map_err(|e| Error::Config(format!("Invalid 'retry' section: {}", e)))?;
    }
    if let Some(connection) = root.get("connection") {
        config.connection = serde_json::from_value(connection.clone())
            .map_err(|e| Error::Config(format!("Invalid 'connection' section: {}", e)))?;
    }
    if let Some(dir) = root.get("schemaDir").and_then(|d| d.as_str()) {
        config.schema_dir = Some(dir.into());
    }

    for (name, entry) in targets {
        match TargetConfig::from_entry(name, entry, &config.connection) {
            Ok(target) => {
                config.targets.insert(name.clone(), target);
            }
            Err(e) => error!("Skipping target '{}': {}", name, e),
        }
    }

    info!(
        "Successfully loaded configuration with {} targets",
        config.targets.len()
    );

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// Loads a `.env` file if present and overlays any set variables.
pub fn apply_env_overrides(config: &mut Config) -> Result<()> {
    dotenvy::dotenv().ok();

    if let Ok(level) = std::env::var("LOG_LEVEL") {
        config.server.log_level = parse_log_level(&level)?;
    }
    if let Ok(transport) = std::env::var("OTG_MCP_TRANSPORT") {
        config.server.transport = transport.parse()?;
    }
    if let Ok(bind) = std::env::var("OTG_MCP_BIND") {
        config.server.bind = bind;
    }
    if let Ok(port) = std::env::var("OTG_MCP_PORT") {
        match port.parse() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!("Ignoring invalid OTG_MCP_PORT value: {}", port),
        }
    }
    if let Ok(dir) = std::env::var("OTG_MCP_SCHEMA_DIR") {
        config.schema_dir = Some(dir.into());
    }
    if let Ok(retries) = std::env::var("OTG_MCP_MAX_ATTEMPTS") {
        match retries.parse() {
            Ok(v) => config.retry.max_attempts = v,
            Err(_) => warn!("Ignoring invalid OTG_MCP_MAX_ATTEMPTS value: {}", retries),
        }
    }
    if let Ok(v) = std::env::var("OTG_MCP_ACCEPT_INVALID_CERTS") {
        config.connection.accept_invalid_certs = v == "true" || v == "1";
    }

    Ok(())
}
