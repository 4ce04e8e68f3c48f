//! Common test utilities for integration tests
//!
//! Provides shared fixtures, helpers, and test utilities used across
//! multiple integration test files.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tripwire::domain::ports::{Level, Logger, ManualClock};
use tripwire::{CircuitBreakerConfig, CircuitBreakerManager};

/// A single captured log call.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct LogEntry {
    pub level: Level,
    pub message: String,
    pub fields: HashMap<String, Value>,
}

/// Logger that keeps every record in memory.
#[derive(Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<LogEntry>>,
}

#[allow(dead_code)]
impl RecordingLogger {
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Messages logged at `level`, in order.
    pub fn messages(&self, level: Level) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message)
            .collect()
    }
}

#[async_trait]
impl Logger for RecordingLogger {
    async fn log(&self, level: Level, message: &str, fields: HashMap<String, Value>) {
        self.entries.lock().unwrap().push(LogEntry {
            level,
            message: message.to_string(),
            fields,
        });
    }
}

/// Manager wired to a manual clock and a recording logger.
#[allow(dead_code)]
pub fn test_manager() -> (CircuitBreakerManager, Arc<ManualClock>, Arc<RecordingLogger>) {
    let clock = Arc::new(ManualClock::starting_now());
    let logger = Arc::new(RecordingLogger::default());
    let manager = CircuitBreakerManager::with_defaults()
        .with_clock(clock.clone())
        .with_logger(logger.clone());
    (manager, clock, logger)
}

/// Breaker config with the rate path effectively disabled.
#[allow(dead_code)]
pub fn counter_only_config(failure_threshold: u32, success_threshold: u32) -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        failure_threshold,
        success_threshold,
        recovery_timeout_secs: 30,
        minimum_requests: 100,
        rolling_window_size: 100,
        ..Default::default()
    }
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
/// Call this at the beginning of tests that need logging.
#[allow(dead_code)]
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
