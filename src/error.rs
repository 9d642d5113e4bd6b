//! Error types for the OTG MCP bridge

use thiserror::Error;

/// Result type alias using the bridge's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the OTG MCP bridge
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Target name is not present in the configuration
    #[error("Target '{0}' not found in configuration")]
    UnknownTarget(String),

    /// No schema bundled for the requested API version
    #[error("Schema version {0} not found")]
    UnknownVersion(String),

    /// A component path does not exist in a schema document
    #[error("Schema component not found: {0}")]
    SchemaNotFound(String),

    /// Payload does not match the schema for its operation
    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    /// Connection-level failure that may succeed on a later attempt
    #[error("Transient connection error: {0}")]
    TransientConnection(String),

    /// Traffic generator answered with a non-retryable error status
    #[error("OTG error (status {status}): {message}")]
    Otg { status: u16, message: String },

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML schema parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::TransientConnection(_) => true,
            Error::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }

    /// Check if error is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::UnknownTarget(_)
                | Error::UnknownVersion(_)
                | Error::SchemaNotFound(_)
                | Error::SchemaValidation(_)
                | Error::InvalidInput(_)
        )
    }

    /// Stable snake_case tag used in structured failure payloads
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::UnknownTarget(_) => "unknown_target",
            Error::UnknownVersion(_) => "unknown_version",
            Error::SchemaNotFound(_) => "schema_not_found",
            Error::SchemaValidation(_) => "schema_validation_error",
            Error::TransientConnection(_) => "transient_connection_error",
            Error::Otg { .. } => "otg_error",
            Error::Http(_) => "http_error",
            Error::Json(_) => "json_error",
            Error::Yaml(_) => "yaml_error",
            Error::Io(_) => "io_error",
            Error::InvalidInput(_) => "invalid_input",
            Error::Internal(_) => "internal_error",
        }
    }
}
