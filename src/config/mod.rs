//! Configuration module
//!
//! Split into focused modules:
//! - types/mod.rs: Core configuration types (Config, ServerConfig, TransportMode)
//! - types/target.rs: Traffic generator targets and port mappings
//! - types/connection.rs: HTTP session and retry policy
//! - io.rs: Configuration loading and environment overrides
//! - validation.rs: Configuration validation
//! - paths.rs: Configuration file paths

mod io;
mod paths;
mod types;
mod validation;

// Re-export core config types
pub use types::{parse_log_level, Config, ServerConfig, TransportMode, LOG_LEVELS};

// Re-export target types
pub use types::target::{split_host_port, PortConfig, TargetConfig, DEFAULT_API_VERSION};

// Re-export connection types
pub use types::connection::{ConnectionConfig, RetryConfig};

// Re-export IO and utilities
pub use io::{apply_env_overrides, load_config, load_config_from_path, parse_config};
pub use paths::{config_dir, config_path};
pub use validation::{validate_config, ConfigValidationResult, ValidationIssue};
