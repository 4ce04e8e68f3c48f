//! Null logger implementation.
//!
//! Used when log output is not wanted but the manager requires a Logger.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use super::{Level, Logger};

/// A logger that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl NullLogger {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Logger for NullLogger {
    async fn log(&self, _level: Level, _message: &str, _fields: HashMap<String, Value>) {}
}
