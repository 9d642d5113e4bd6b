//! Connection and retry configuration for traffic generator sessions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP session settings shared by all target clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// URL scheme used to reach controllers
    #[serde(default = "default_scheme")]
    pub scheme: String,
    /// Port used when a target name carries no explicit port
    #[serde(default = "default_target_port")]
    pub default_port: u16,
    /// Per-request timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    /// Accept self-signed controller certificates
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            scheme: default_scheme(),
            default_port: default_target_port(),
            timeout: default_timeout(),
            accept_invalid_certs: true,
        }
    }
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_target_port() -> u16 {
    443
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_true() -> bool {
    true
}

/// Bounded exponential backoff for transient failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the second attempt
    #[serde(default = "default_initial_interval", with = "humantime_serde")]
    pub initial_interval: Duration,
    /// Upper bound for a single delay
    #[serde(default = "default_max_interval", with = "humantime_serde")]
    pub max_interval: Duration,
    /// Growth factor between delays
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: default_max_attempts(),
            initial_interval: default_initial_interval(),
            max_interval: default_max_interval(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetryConfig {
    /// Policy with no delay between attempts, used by tests
    pub fn immediate(max_attempts: u32) -> Self {
        RetryConfig {
            max_attempts,
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(1),
            multiplier: 1.0,
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_interval() -> Duration {
    Duration::from_millis(200)
}

fn default_max_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_multiplier() -> f64 {
    2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_defaults() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.initial_interval, Duration::from_millis(200));
        assert_eq!(retry.max_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_humantime_durations() {
        let retry: RetryConfig = serde_json::from_str(
            r#"{"max_attempts": 5, "initial_interval": "50ms", "max_interval": "2s"}"#,
        )
        .unwrap();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.initial_interval, Duration::from_millis(50));
        assert_eq!(retry.max_interval, Duration::from_secs(2));
        assert_eq!(retry.multiplier, 2.0);
    }

    #[test]
    fn test_connection_defaults() {
        let conn: ConnectionConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(conn.scheme, "https");
        assert_eq!(conn.default_port, 443);
        assert_eq!(conn.timeout, Duration::from_secs(30));
        assert!(conn.accept_invalid_certs);
    }
}
