//! `Logger` adapter that forwards to `tracing`.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::domain::ports::{Level, Logger};

/// Forwards structured log calls to the global `tracing` subscriber.
///
/// Fields are rendered as a single JSON object under the `fields` key so the
/// JSON formatter keeps them machine-readable.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Logger for TracingLogger {
    async fn log(&self, level: Level, message: &str, fields: HashMap<String, Value>) {
        if fields.is_empty() {
            match level {
                Level::Trace => tracing::trace!(target: "tripwire", "{message}"),
                Level::Debug => tracing::debug!(target: "tripwire", "{message}"),
                Level::Info => tracing::info!(target: "tripwire", "{message}"),
                Level::Warn => tracing::warn!(target: "tripwire", "{message}"),
                Level::Error => tracing::error!(target: "tripwire", "{message}"),
            }
            return;
        }

        let fields = Value::Object(fields.into_iter().collect::<Map<String, Value>>());
        match level {
            Level::Trace => tracing::trace!(target: "tripwire", fields = %fields, "{message}"),
            Level::Debug => tracing::debug!(target: "tripwire", fields = %fields, "{message}"),
            Level::Info => tracing::info!(target: "tripwire", fields = %fields, "{message}"),
            Level::Warn => tracing::warn!(target: "tripwire", fields = %fields, "{message}"),
            Level::Error => tracing::error!(target: "tripwire", fields = %fields, "{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_logs_without_subscriber() {
        let logger = TracingLogger::new();
        let mut fields = HashMap::new();
        fields.insert("endpoint".to_string(), json!("svc"));
        logger.log(Level::Warn, "circuit breaker opened", fields).await;
        logger.info("plain message").await;
    }
}
