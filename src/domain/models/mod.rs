pub mod circuit;
pub mod config;

pub use circuit::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState, CircuitStatsSummary,
    CircuitSummary, CircuitTransition, TransitionCause,
};
pub use config::{CleanupConfig, Config, EndpointConfig, LogFormat, LoggingConfig, RotationPolicy};
