//! Traffic generator target configuration

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, error, info};

use super::connection::ConnectionConfig;
use crate::error::{Error, Result};

/// API version assumed when a target entry does not declare one
pub const DEFAULT_API_VERSION: &str = "1.30.0";

/// A port on a traffic generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfig {
    /// Location of the port (hostname:port or chassis;card;port)
    pub location: String,
    /// Name of the port as used in OTG configs
    pub name: String,
}

/// A single addressable traffic generator instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Target name as written in the config file
    pub name: String,
    /// Controller host
    pub host: String,
    /// Controller port
    pub port: u16,
    /// OTG API schema version for this target
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    /// Logical port name to physical location
    pub ports: BTreeMap<String, PortConfig>,
}

impl TargetConfig {
    /// Create a target with no ports
    pub fn new(name: impl Into<String>, api_version: impl Into<String>, default_port: u16) -> Self {
        let name = name.into();
        let (host, port) = split_host_port(&name, default_port);
        TargetConfig {
            name,
            host,
            port,
            api_version: api_version.into(),
            ports: BTreeMap::new(),
        }
    }

    /// Add a port mapping
    pub fn with_port(mut self, key: impl Into<String>, location: impl Into<String>) -> Self {
        let key = key.into();
        self.ports.insert(
            key.clone(),
            PortConfig {
                location: location.into(),
                name: key,
            },
        );
        self
    }

    /// Development target used when no config file exists
    pub fn development(connection: &ConnectionConfig) -> Self {
        TargetConfig::new("localhost:8443", DEFAULT_API_VERSION, connection.default_port)
            .with_port("p1", "localhost:5555")
            .with_port("p2", "localhost:5555")
    }

    /// Build a target from one entry of the config file's `targets` object.
    ///
    /// Malformed port entries are logged and skipped. An entry that is not
    /// an object or has no `ports` object is rejected.
    pub fn from_entry(name: &str, entry: &Value, connection: &ConnectionConfig) -> Result<Self> {
        let obj = entry
            .as_object()
            .ok_or_else(|| Error::Config(format!("Target '{}' must be an object", name)))?;

        let ports = obj
            .get("ports")
            .and_then(|p| p.as_object())
            .ok_or_else(|| {
                Error::Config(format!("Target '{}' must contain a 'ports' dictionary", name))
            })?;

        let api_version = match obj.get("apiVersion") {
            Some(Value::String(v)) => v.clone(),
            Some(other) => {
                return Err(Error::Config(format!(
                    "Target '{}' has a non-string apiVersion: {}",
                    name, other
                )))
            }
            None => DEFAULT_API_VERSION.to_string(),
        };
        info!("Target {} using API version: {}", name, api_version);

        let mut target = TargetConfig::new(name, api_version, connection.default_port);

        if let Some(host) = obj.get("host").and_then(|h| h.as_str()) {
            target.host = host.to_string();
        }
        if let Some(port) = obj.get("port").and_then(|p| p.as_u64()) {
            target.port = u16::try_from(port).map_err(|_| {
                Error::Config(format!("Target '{}' has an out-of-range port {}", name, port))
            })?;
        }

        for (port_name, port_data) in ports {
            let Some(port_obj) = port_data.as_object() else {
                error!(
                    "Port '{}' for target '{}' must be a dictionary",
                    port_name, name
                );
                continue;
            };

            let Some(location) = port_obj.get("location").and_then(|l| l.as_str()) else {
                error!(
                    "Port '{}' for target '{}' must contain a 'location' property",
                    port_name, name
                );
                continue;
            };

            let display_name = port_obj
                .get("name")
                .and_then(|n| n.as_str())
                .unwrap_or(port_name);

            debug!(
                "Creating port config for {} with location {}",
                port_name, location
            );
            target.ports.insert(
                port_name.clone(),
                PortConfig {
                    location: location.to_string(),
                    name: display_name.to_string(),
                },
            );
        }

        Ok(target)
    }

    /// Base URL of the controller's REST API
    pub fn base_url(&self, scheme: &str) -> Result<url::Url> {
        let raw = format!("{}://{}:{}", scheme, self.host, self.port);
        url::Url::parse(&raw)
            .map_err(|e| Error::Config(format!("Invalid address for target '{}': {}", self.name, e)))
    }

    /// OTG port names in configuration order
    pub fn port_names(&self) -> Vec<String> {
        self.ports.values().map(|p| p.name.clone()).collect()
    }
}

/// Split `host:port` into its parts, falling back to `default_port`.
///
/// Bracketed IPv6 literals (`[::1]:8443`) keep their brackets.
pub fn split_host_port(address: &str, default_port: u16) -> (String, u16) {
    if let Some((host, port)) = address.rsplit_once(':') {
        let bare_ipv6 = host.contains(':') && !host.starts_with('[');
        if !bare_ipv6 {
            if let Ok(port) = port.parse::<u16>() {
                return (host.to_string(), port);
            }
        }
    }
    (address.to_string(), default_port)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_host_port() {
        assert_eq!(split_host_port("lab1:8443", 443), ("lab1".to_string(), 8443));
        assert_eq!(split_host_port("lab1", 443), ("lab1".to_string(), 443));
        assert_eq!(split_host_port("[::1]:8443", 443), ("[::1]".to_string(), 8443));
        assert_eq!(split_host_port("fe80::1", 443), ("fe80::1".to_string(), 443));
        assert_eq!(split_host_port("lab1:http", 443), ("lab1:http".to_string(), 443));
    }

    #[test]
    fn test_from_entry() {
        let entry = json!({
            "apiVersion": "1.30.0",
            "ports": {
                "p1": {"location": "10.0.0.1:5555", "name": "tx"},
                "p2": {"location": "10.0.0.2:5555"}
            }
        });
        let target =
            TargetConfig::from_entry("lab1:8443", &entry, &ConnectionConfig::default()).unwrap();

        assert_eq!(target.host, "lab1");
        assert_eq!(target.port, 8443);
        assert_eq!(target.api_version, "1.30.0");
        assert_eq!(target.ports["p1"].name, "tx");
        assert_eq!(target.ports["p2"].name, "p2");
        assert_eq!(target.port_names(), vec!["tx", "p2"]);
    }

    #[test]
    fn test_from_entry_skips_bad_ports() {
        let entry = json!({
            "ports": {
                "p1": {"location": "localhost:5555"},
                "p2": "not-a-dict",
                "p3": {"name": "missing-location"}
            }
        });
        let target =
            TargetConfig::from_entry("lab1", &entry, &ConnectionConfig::default()).unwrap();

        assert_eq!(target.api_version, DEFAULT_API_VERSION);
        assert_eq!(target.port, 443);
        assert_eq!(target.ports.len(), 1);
        assert!(target.ports.contains_key("p1"));
    }

    #[test]
    fn test_from_entry_requires_ports() {
        let entry = json!({"apiVersion": "1.30.0"});
        assert!(TargetConfig::from_entry("lab1", &entry, &ConnectionConfig::default()).is_err());
        assert!(TargetConfig::from_entry("lab1", &json!([]), &ConnectionConfig::default()).is_err());
    }

    #[test]
    fn test_explicit_host_and_port() {
        let entry = json!({"host": "10.1.1.1", "port": 9443, "ports": {}});
        let target =
            TargetConfig::from_entry("lab1", &entry, &ConnectionConfig::default()).unwrap();
        assert_eq!(target.host, "10.1.1.1");
        assert_eq!(target.port, 9443);
        assert_eq!(
            target.base_url("https").unwrap().as_str(),
            "https://10.1.1.1:9443/"
        );
    }
}
