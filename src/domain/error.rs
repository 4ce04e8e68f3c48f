use thiserror::Error;

/// Configuration validation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid failure_threshold: {0}. Must be at least 1")]
    InvalidFailureThreshold(u32),

    #[error("Invalid success_threshold: {0}. Must be at least 1")]
    InvalidSuccessThreshold(u32),

    #[error("Invalid rolling_window_size: {0}. Must be at least 1")]
    InvalidRollingWindowSize(usize),

    #[error("Invalid minimum_requests: {0}. Must be at least 1")]
    InvalidMinimumRequests(usize),

    #[error(
        "Invalid minimum_requests: {minimum_requests} exceeds rolling_window_size {rolling_window_size}"
    )]
    MinimumRequestsExceedsWindow {
        minimum_requests: usize,
        rolling_window_size: usize,
    },

    #[error("Invalid failure_rate_threshold: {0}. Must be in (0.0, 1.0]")]
    InvalidFailureRateThreshold(f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid cleanup interval_secs: {0}. Must be at least 1")]
    InvalidCleanupInterval(u64),

    #[error("Endpoint name cannot be empty")]
    EmptyEndpointName,

    #[error("Duplicate endpoint name: {0}")]
    DuplicateEndpoint(String),

    #[error("Invalid configuration for endpoint '{name}': {source}")]
    InvalidEndpoint {
        name: String,
        #[source]
        source: Box<ConfigError>,
    },
}
