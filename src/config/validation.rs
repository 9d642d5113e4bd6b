//! Configuration validation
//!
//! Validates configuration and reports issues.

use std::collections::HashSet;

use super::types::{parse_log_level, Config, TransportMode};
use crate::schema::normalize_version;

/// Result of configuration validation
#[derive(Debug, Clone)]
pub struct ConfigValidationResult {
    /// Whether the config is valid
    pub valid: bool,
    /// Validation errors (critical)
    pub errors: Vec<ValidationIssue>,
    /// Validation warnings (non-critical)
    pub warnings: Vec<ValidationIssue>,
}

impl ConfigValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        ConfigValidationResult {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn with_error(mut self, issue: ValidationIssue) -> Self {
        self.valid = false;
        self.errors.push(issue);
        self
    }

    /// Add a warning
    pub fn with_warning(mut self, issue: ValidationIssue) -> Self {
        self.warnings.push(issue);
        self
    }
}

/// A validation issue
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Path to the config field
    pub path: String,
    /// Issue message
    pub message: String,
    /// Suggested fix
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Create a new issue
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationIssue {
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Add a suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

/// Validate the configuration against the schema versions available at runtime
pub fn validate_config(config: &Config, available_versions: &[String]) -> ConfigValidationResult {
    let mut result = ConfigValidationResult::valid();

    result = validate_server_config(config, result);
    result = validate_retry_config(config, result);
    result = validate_targets(config, available_versions, result);

    result
}

fn validate_server_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if let Err(e) = parse_log_level(&config.server.log_level) {
        result = result.with_error(ValidationIssue::new("server.log_level", e.to_string()));
    }

    if config.server.transport == TransportMode::Http && config.server.port == 0 {
        result = result.with_error(
            ValidationIssue::new("server.port", "HTTP transport needs a non-zero port")
                .with_suggestion("Set server.port or OTG_MCP_PORT"),
        );
    }

    result
}

fn validate_retry_config(config: &Config, mut result: ConfigValidationResult) -> ConfigValidationResult {
    if config.retry.max_attempts == 0 {
        result = result.with_error(
            ValidationIssue::new("retry.max_attempts", "At least one attempt is required")
                .with_suggestion("Use 1 to disable retries"),
        );
    }

    if config.retry.multiplier < 1.0 {
        result = result.with_error(ValidationIssue::new(
            "retry.multiplier",
            format!("Multiplier must be >= 1.0, got {}", config.retry.multiplier),
        ));
    }

    result
}

fn validate_targets(
    config: &Config,
    available_versions: &[String],
    mut result: ConfigValidationResult,
) -> ConfigValidationResult {
    if config.targets.is_empty() {
        result = result.with_warning(
            ValidationIssue::new("targets", "No traffic generator targets configured")
                .with_suggestion("Add at least one entry under 'targets' in the config file"),
        );
    }

    let known: HashSet<String> = available_versions
        .iter()
        .map(|v| normalize_version(v))
        .collect();

    for (name, target) in &config.targets {
        if !known.contains(&normalize_version(&target.api_version)) {
            result = result.with_warning(
                ValidationIssue::new(
                    format!("targets.{}.apiVersion", name),
                    format!("No bundled schema for API version {}", target.api_version),
                )
                .with_suggestion(format!("Available versions: {}", available_versions.join(", "))),
            );
        }

        if target.ports.is_empty() {
            result = result.with_warning(ValidationIssue::new(
                format!("targets.{}.ports", name),
                "Target has no ports configured",
            ));
        }

        let mut seen = HashSet::new();
        for (port_key, port) in &target.ports {
            if port.location.trim().is_empty() {
                result = result.with_error(ValidationIssue::new(
                    format!("targets.{}.ports.{}.location", name, port_key),
                    "Port location must not be empty",
                ));
            }
            if !seen.insert(port.name.as_str()) {
                result = result.with_error(ValidationIssue::new(
                    format!("targets.{}.ports.{}.name", name, port_key),
                    format!("Duplicate port name '{}'", port.name),
                ));
            }
        }
    }

    result
}
