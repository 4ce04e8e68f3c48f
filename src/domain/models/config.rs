use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::circuit::CircuitBreakerConfig;

/// Main configuration structure for Tripwire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Default configuration for breakers registered without an explicit one
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,

    /// Endpoints registered at startup
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,

    /// Periodic removal of inactive breakers
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,

    /// Directory for log files (if None, logs only go to stderr)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Also log to stderr when a log directory is set
    #[serde(default = "default_true")]
    pub enable_stderr: bool,

    /// File rotation policy
    #[serde(default)]
    pub rotation: RotationPolicy,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}

fn default_log_level() -> String {
    "info".to_string()
}

const fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            log_dir: None,
            enable_stderr: true,
            rotation: RotationPolicy::default(),
        }
    }
}

/// A named endpoint with optional overrides of the default breaker config
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct EndpointConfig {
    /// Resource name used with the manager
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_threshold: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recovery_timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_request_timeout_secs: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_threshold: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rolling_window_size: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_requests: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_rate_threshold: Option<f64>,
}

impl EndpointConfig {
    /// Endpoint that uses the default breaker config unchanged.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Apply this endpoint's overrides on top of `base`.
    pub fn resolve(&self, base: &CircuitBreakerConfig) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold.unwrap_or(base.failure_threshold),
            recovery_timeout_secs: self
                .recovery_timeout_secs
                .unwrap_or(base.recovery_timeout_secs),
            test_request_timeout_secs: self
                .test_request_timeout_secs
                .unwrap_or(base.test_request_timeout_secs),
            success_threshold: self.success_threshold.unwrap_or(base.success_threshold),
            rolling_window_size: self.rolling_window_size.unwrap_or(base.rolling_window_size),
            minimum_requests: self.minimum_requests.unwrap_or(base.minimum_requests),
            failure_rate_threshold: self
                .failure_rate_threshold
                .unwrap_or(base.failure_rate_threshold),
        }
    }
}

/// Cleanup daemon configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CleanupConfig {
    /// Run the cleanup daemon
    #[serde(default)]
    pub enabled: bool,

    /// Seconds between cleanup passes
    #[serde(default = "default_cleanup_interval_secs")]
    pub interval_secs: u64,

    /// Breakers idle for longer than this are removed
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u64,
}

const fn default_cleanup_interval_secs() -> u64 {
    3600
}

const fn default_max_age_hours() -> u64 {
    24
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_cleanup_interval_secs(),
            max_age_hours: default_max_age_hours(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_resolve_keeps_base_when_unset() {
        let base = CircuitBreakerConfig::default();
        let endpoint = EndpointConfig::named("billing");
        assert_eq!(endpoint.resolve(&base), base);
    }

    #[test]
    fn test_endpoint_resolve_applies_overrides() {
        let base = CircuitBreakerConfig::default();
        let endpoint = EndpointConfig {
            name: "llm".to_string(),
            failure_threshold: Some(2),
            minimum_requests: Some(1),
            ..Default::default()
        };

        let resolved = endpoint.resolve(&base);
        assert_eq!(resolved.failure_threshold, 2);
        assert_eq!(resolved.minimum_requests, 1);
        assert_eq!(resolved.success_threshold, base.success_threshold);
        assert_eq!(resolved.recovery_timeout_secs, base.recovery_timeout_secs);
    }

    #[test]
    fn test_config_yaml_parsing() {
        let yaml = r"
logging:
  level: debug
  format: pretty
circuit_breaker:
  failure_threshold: 7
endpoints:
  - name: payments
    recovery_timeout_secs: 5
  - name: search
cleanup:
  enabled: true
  interval_secs: 60
";
        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.logging.rotation, RotationPolicy::Daily);
        assert_eq!(config.circuit_breaker.failure_threshold, 7);
        assert_eq!(config.circuit_breaker.success_threshold, 3);
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints[0].recovery_timeout_secs, Some(5));
        assert_eq!(config.endpoints[1], EndpointConfig::named("search"));
        assert!(config.cleanup.enabled);
        assert_eq!(config.cleanup.interval_secs, 60);
        assert_eq!(config.cleanup.max_age_hours, 24);
    }
}
