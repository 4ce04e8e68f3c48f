//! Tripwire setup and composition root
//!
//! - Project initialization (`.tripwire/config.yaml`)
//! - Building a `CircuitBreakerManager` from configuration
//! - Starting the optional cleanup daemon

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::models::Config;
use crate::domain::ports::{Clock, Logger};
use crate::infrastructure::config::CONFIG_DIR;
use crate::services::{
    CircuitBreakerManager, CleanupDaemon, CleanupDaemonConfig, CleanupEvent, DaemonHandle,
};

/// Default configuration template content
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Tripwire Configuration
# Override settings by editing this file or setting environment variables
# with the TRIPWIRE_ prefix (use __ for nested keys)
#
# Example environment variables:
#   export TRIPWIRE_LOGGING__LEVEL=debug
#   export TRIPWIRE_CIRCUIT_BREAKER__FAILURE_THRESHOLD=3

logging:
  # Log level: trace, debug, info, warn, error
  level: "info"
  # Log format: json, pretty
  format: "json"
  # Rotation for files in log_dir: daily, hourly, never
  rotation: "daily"

# Defaults for every breaker registered without its own config
circuit_breaker:
  # Consecutive failures that open the circuit
  failure_threshold: 5
  # Seconds an open circuit waits before admitting a trial request
  recovery_timeout_secs: 60
  # Upper bound in seconds for a single trial request
  test_request_timeout_secs: 5
  # Consecutive trial successes needed to close the circuit
  success_threshold: 3
  # Number of recent outcomes used for the failure rate
  rolling_window_size: 100
  # Failure rate is ignored below this many samples
  minimum_requests: 10
  # Failure rate strictly above which the circuit opens
  failure_rate_threshold: 0.5

# Endpoints registered at startup. Any breaker field may be overridden.
endpoints:
  - name: "llm-provider"
    failure_threshold: 3
  - name: "vector-store"

# Periodic removal of breakers with no recent traffic
cleanup:
  enabled: false
  interval_secs: 3600
  max_age_hours: 24
"#;

/// Setup paths and directories
pub struct SetupPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
}

impl SetupPaths {
    /// Get setup paths for the current directory
    pub fn new() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(Self::for_dir(&current_dir))
    }

    /// Get setup paths rooted at `dir`
    pub fn for_dir(dir: &Path) -> Self {
        let config_dir = dir.join(CONFIG_DIR);
        Self {
            config_file: config_dir.join("config.yaml"),
            config_dir,
        }
    }

    /// Check if Tripwire is already initialized
    pub fn is_initialized(&self) -> bool {
        self.config_file.exists()
    }
}

/// Create the configuration directory and default config file.
///
/// Returns `false` if a config file already existed and `force` was not set.
pub fn init_project(paths: &SetupPaths, force: bool) -> Result<bool> {
    if paths.is_initialized() && !force {
        return Ok(false);
    }

    fs::create_dir_all(&paths.config_dir).context("Failed to create config directory")?;
    fs::write(&paths.config_file, DEFAULT_CONFIG_TEMPLATE)
        .context("Failed to write config file")?;

    Ok(true)
}

/// Build a manager from configuration and register every configured endpoint.
pub async fn build_manager(
    config: &Config,
    clock: Arc<dyn Clock>,
    logger: Arc<dyn Logger>,
) -> Result<Arc<CircuitBreakerManager>> {
    let manager = CircuitBreakerManager::new(config.circuit_breaker.clone())
        .context("Invalid default circuit breaker configuration")?
        .with_clock(clock)
        .with_logger(logger);

    for endpoint in &config.endpoints {
        manager
            .register_endpoint(&endpoint.name, Some(endpoint.resolve(&config.circuit_breaker)))
            .await
            .with_context(|| format!("Invalid configuration for endpoint '{}'", endpoint.name))?;
    }

    Ok(Arc::new(manager))
}

/// Start the cleanup daemon if it is enabled in configuration.
pub fn start_cleanup_daemon(
    manager: &Arc<CircuitBreakerManager>,
    config: &Config,
) -> Option<(DaemonHandle, tokio::sync::mpsc::Receiver<CleanupEvent>)> {
    if !config.cleanup.enabled {
        return None;
    }

    let daemon = CleanupDaemon::new(manager.clone(), CleanupDaemonConfig::from(&config.cleanup));
    let handle = daemon.handle();
    Some((handle, daemon.run()))
}
