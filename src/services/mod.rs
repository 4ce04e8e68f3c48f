//! Service layer
//!
//! - `circuit_breaker_manager`: the breaker registry every caller talks to
//! - `guard`: caller-side wrapper that reports outcomes automatically
//! - `cleanup_daemon`: optional periodic removal of idle breakers

pub mod circuit_breaker_manager;
pub mod cleanup_daemon;
pub mod guard;

pub use circuit_breaker_manager::{
    CircuitBreakerManager, CircuitCheck, DEFAULT_MAX_INACTIVE_HOURS,
};
pub use cleanup_daemon::{CleanupDaemon, CleanupDaemonConfig, CleanupEvent, DaemonHandle};
pub use guard::{with_circuit_breaker, GuardError};
