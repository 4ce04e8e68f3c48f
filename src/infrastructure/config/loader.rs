use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::collections::HashSet;
use std::path::Path;

use crate::domain::error::ConfigError;
use crate::domain::models::config::Config;

/// Project configuration directory
pub const CONFIG_DIR: &str = ".tripwire";

/// Prefix for environment variable overrides
pub const ENV_PREFIX: &str = "TRIPWIRE_";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .tripwire/config.yaml (project config)
    /// 3. .tripwire/local.yaml (local overrides, optional)
    /// 4. Environment variables (TRIPWIRE_* prefix, `__` separates nested keys)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(format!("{CONFIG_DIR}/config.yaml")))
            .merge(Yaml::file(format!("{CONFIG_DIR}/local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        config.circuit_breaker.validate()?;

        let mut seen = HashSet::new();
        for endpoint in &config.endpoints {
            if endpoint.name.trim().is_empty() {
                return Err(ConfigError::EmptyEndpointName);
            }
            if !seen.insert(endpoint.name.as_str()) {
                return Err(ConfigError::DuplicateEndpoint(endpoint.name.clone()));
            }
            endpoint
                .resolve(&config.circuit_breaker)
                .validate()
                .map_err(|source| ConfigError::InvalidEndpoint {
                    name: endpoint.name.clone(),
                    source: Box::new(source),
                })?;
        }

        if config.cleanup.interval_secs == 0 {
            return Err(ConfigError::InvalidCleanupInterval(
                config.cleanup.interval_secs,
            ));
        }

        Ok(())
    }
}
