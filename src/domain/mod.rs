//! Domain layer for Tripwire
//!
//! This module contains the circuit breaker state machine, configuration
//! models and the ports the service layer depends on.

pub mod error;
pub mod models;
pub mod ports;

pub use error::ConfigError;
