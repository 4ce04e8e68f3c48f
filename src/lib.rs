//! Tripwire - circuit breaker registry
//!
//! Tripwire keeps one circuit breaker per named resource (an API endpoint, an
//! agent, a model provider) and tells callers whether a request may proceed.
//! Breakers open after consecutive failures or a high failure rate, admit
//! trial requests after a recovery timeout, and close again once the resource
//! recovers.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): breaker state machine, configuration, ports
//! - **Service Layer** (`services`): the registry, guard helper, cleanup daemon
//! - **Infrastructure Layer** (`infrastructure`): config loading, logging, setup
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```
//! use tripwire::{CircuitBreakerConfig, CircuitBreakerManager, CircuitState};
//!
//! # tokio_test::block_on(async {
//! let manager = CircuitBreakerManager::with_defaults();
//! let config = CircuitBreakerConfig { failure_threshold: 2, ..Default::default() };
//! manager.register_endpoint("search", Some(config)).await?;
//!
//! if manager.is_request_allowed("search").await {
//!     // ... call the search service ...
//!     manager.record_failure("search").await;
//! }
//! manager.record_failure("search").await;
//!
//! assert_eq!(manager.get_circuit_state("search").await, Some(CircuitState::Open));
//! assert!(!manager.is_request_allowed("search").await);
//! # Ok::<(), tripwire::ConfigError>(())
//! # }).unwrap();
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::models::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState, CircuitSummary,
    CircuitTransition, Config, EndpointConfig, TransitionCause,
};
pub use domain::ports::{Clock, Logger, ManualClock, SystemClock};
pub use domain::ConfigError;
pub use infrastructure::config::ConfigLoader;
pub use services::{
    with_circuit_breaker, CircuitBreakerManager, CircuitCheck, GuardError,
    DEFAULT_MAX_INACTIVE_HOURS,
};
