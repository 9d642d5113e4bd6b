//! Configuration paths
//!
//! Utilities for resolving configuration file paths.

use std::path::PathBuf;

/// Get the configuration directory
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("OTG_MCP_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    // XDG config directory or fallback
    dirs::config_dir()
        .map(|d| d.join("otg-mcp"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".config").join("otg-mcp"))
                .unwrap_or_else(|| PathBuf::from(".otg-mcp"))
        })
}

/// Get the default target file path
pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("OTG_MCP_CONFIG") {
        return PathBuf::from(path);
    }

    config_dir().join("targets.json")
}
