use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// Log level for structured logging
///
/// Levels are ordered from most verbose (Trace) to most severe (Error).
///
/// # Examples
///
/// ```
/// use tripwire::domain::ports::Level;
///
/// assert!(Level::Error > Level::Info);
/// assert!(Level::Trace < Level::Debug);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Most verbose level
    Trace,
    /// Debugging detail
    Debug,
    /// Normal operations
    Info,
    /// Potentially problematic situations
    Warn,
    /// Failure conditions
    Error,
}

impl Level {
    /// Returns the string representation of the log level
    ///
    /// ```
    /// use tripwire::domain::ports::Level;
    ///
    /// assert_eq!(Level::Warn.as_str(), "WARN");
    /// ```
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

/// Port for structured logging
///
/// The circuit breaker manager reports registrations, state transitions and
/// cleanup through this trait instead of calling a logging backend directly,
/// so the state machine can be exercised in tests with a recording or null
/// logger. The production adapter is
/// `infrastructure::logging::TracingLogger`.
///
/// Only `log` is required; the per-level helpers forward to it with no fields.
///
/// # Examples
///
/// ```
/// use tripwire::domain::ports::{Level, Logger};
/// use serde_json::json;
/// use std::collections::HashMap;
///
/// async fn report(logger: &dyn Logger, endpoint: &str) {
///     let mut fields = HashMap::new();
///     fields.insert("endpoint".to_string(), json!(endpoint));
///     logger.log(Level::Warn, "circuit opened", fields).await;
///
///     logger.info("recovery probe scheduled").await;
/// }
/// ```
#[async_trait]
pub trait Logger: Send + Sync {
    /// Log a message with a level and structured fields
    async fn log(&self, level: Level, message: &str, fields: HashMap<String, Value>);

    /// Log a trace-level message
    async fn trace(&self, message: &str) {
        self.log(Level::Trace, message, HashMap::new()).await;
    }

    /// Log a debug-level message
    async fn debug(&self, message: &str) {
        self.log(Level::Debug, message, HashMap::new()).await;
    }

    /// Log an info-level message
    async fn info(&self, message: &str) {
        self.log(Level::Info, message, HashMap::new()).await;
    }

    /// Log a warning-level message
    async fn warn(&self, message: &str) {
        self.log(Level::Warn, message, HashMap::new()).await;
    }

    /// Log an error-level message
    async fn error(&self, message: &str) {
        self.log(Level::Error, message, HashMap::new()).await;
    }
}
