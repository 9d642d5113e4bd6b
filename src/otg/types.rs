//! Response models returned by the bridge

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::PortConfig;
use crate::error::Error;

/// Body of `GET /capabilities/version`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitiesVersion {
    #[serde(default)]
    pub api_spec_version: String,
    #[serde(default)]
    pub sdk_version: String,
    #[serde(default)]
    pub app_version: String,
}

/// Health of a single target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetHealth {
    pub name: String,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_info: Option<CapabilitiesVersion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TargetHealth {
    pub fn healthy(name: impl Into<String>, version: CapabilitiesVersion) -> Self {
        TargetHealth {
            name: name.into(),
            healthy: true,
            version_info: Some(version),
            error: None,
        }
    }

    pub fn unhealthy(name: impl Into<String>, error: impl Into<String>) -> Self {
        TargetHealth {
            name: name.into(),
            healthy: false,
            version_info: None,
            error: Some(error.into()),
        }
    }
}

/// Health of all checked targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `success` when every checked target is healthy, else `error`
    pub status: String,
    pub targets: BTreeMap<String, TargetHealth>,
    /// When the check completed
    pub checked_at: DateTime<Utc>,
}

impl HealthStatus {
    /// Aggregate per-target results
    pub fn from_targets(results: impl IntoIterator<Item = TargetHealth>) -> Self {
        let targets: BTreeMap<String, TargetHealth> =
            results.into_iter().map(|t| (t.name.clone(), t)).collect();
        let status = if targets.values().all(|t| t.healthy) {
            "success"
        } else {
            "error"
        };
        HealthStatus {
            status: status.to_string(),
            targets,
            checked_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// Summary of a configured target for `get_available_targets`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSummary {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub host: String,
    pub port: u16,
    pub ports: BTreeMap<String, PortConfig>,
    /// Whether a schema exists for the target's version
    pub available: bool,
}

/// Structured failure payload returned from a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolFailure {
    pub kind: String,
    pub message: String,
}

impl From<&Error> for ToolFailure {
    fn from(err: &Error) -> Self {
        ToolFailure {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_aggregation() {
        let ok = TargetHealth::healthy("a", CapabilitiesVersion::default());
        let bad = TargetHealth::unhealthy("b", "Connection timeout to host");

        let status = HealthStatus::from_targets(vec![ok.clone()]);
        assert!(status.is_success());

        let status = HealthStatus::from_targets(vec![ok, bad]);
        assert_eq!(status.status, "error");
        assert_eq!(status.targets.len(), 2);
        assert!(status.targets["b"]
            .error
            .as_deref()
            .unwrap()
            .contains("Connection timeout"));
    }

    #[test]
    fn test_health_serialization_skips_empty_fields() {
        let json = serde_json::to_value(TargetHealth::unhealthy("t", "down")).unwrap();
        assert!(json.get("version_info").is_none());
        assert_eq!(json["error"], "down");
    }

    #[test]
    fn test_tool_failure_from_error() {
        let failure = ToolFailure::from(&Error::UnknownTarget("lab9".into()));
        assert_eq!(failure.kind, "unknown_target");
        assert!(failure.message.contains("lab9"));
    }

    #[test]
    fn test_version_tolerates_missing_fields() {
        let v: CapabilitiesVersion =
            serde_json::from_str(r#"{"api_spec_version": "1.30.0"}"#).unwrap();
        assert_eq!(v.api_spec_version, "1.30.0");
        assert!(v.sdk_version.is_empty());
    }
}
