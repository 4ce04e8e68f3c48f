//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber:
//! - JSON or pretty output on stderr
//! - Optional rolling JSON log files via tracing-appender
//! - `TracingLogger`, the adapter for the `Logger` port

pub mod logger;
pub mod tracing_logger;

pub use logger::{parse_log_level, LoggerImpl};
pub use tracing_logger::TracingLogger;
