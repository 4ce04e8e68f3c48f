//! Implementation of the `tripwire status` command.
//!
//! Registers every configured endpoint the way a service would at startup and
//! prints the breaker configuration each one resolves to. Breaker state lives
//! only inside a running process, so nothing about state is reported here.

use anyhow::{Context, Result};
use comfy_table::{Cell, CellAlignment};
use serde::Serialize;
use std::sync::Arc;

use crate::cli::display::{list_table, render_list};
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{CircuitBreakerConfig, Config};
use crate::domain::ports::{NullLogger, SystemClock};
use crate::infrastructure::setup::build_manager;

#[derive(Debug, Serialize)]
pub struct EndpointStatus {
    pub name: String,
    /// Whether any field differs from the default breaker config
    pub overridden: bool,
    pub config: CircuitBreakerConfig,
}

#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub endpoints: Vec<EndpointStatus>,
}

impl CommandOutput for StatusOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&[
            "name",
            "failures",
            "rate >",
            "window",
            "min req",
            "recovery",
            "trial timeout",
            "successes",
        ]);
        for endpoint in &self.endpoints {
            let config = &endpoint.config;
            let name = if endpoint.overridden {
                format!("{} *", endpoint.name)
            } else {
                endpoint.name.clone()
            };
            table.add_row(vec![
                Cell::new(name),
                Cell::new(config.failure_threshold).set_alignment(CellAlignment::Right),
                Cell::new(format!("{:.0}%", config.failure_rate_threshold * 100.0))
                    .set_alignment(CellAlignment::Right),
                Cell::new(config.rolling_window_size).set_alignment(CellAlignment::Right),
                Cell::new(config.minimum_requests).set_alignment(CellAlignment::Right),
                Cell::new(format!("{}s", config.recovery_timeout_secs))
                    .set_alignment(CellAlignment::Right),
                Cell::new(format!("{}s", config.test_request_timeout_secs))
                    .set_alignment(CellAlignment::Right),
                Cell::new(config.success_threshold).set_alignment(CellAlignment::Right),
            ]);
        }

        let mut rendered = render_list("endpoint", &table, self.endpoints.len());
        if self.endpoints.iter().any(|e| e.overridden) {
            rendered.push_str("\n\n* overrides the default breaker config");
        }
        rendered
    }
}

/// Register the configured endpoints and collect their resolved configs, sorted by name.
pub async fn collect_status(config: &Config) -> Result<StatusOutput> {
    let manager = build_manager(config, Arc::new(SystemClock), Arc::new(NullLogger)).await?;

    let mut names: Vec<String> = manager.get_all_circuits().await.into_keys().collect();
    names.sort();

    let mut endpoints = Vec::with_capacity(names.len());
    for name in names {
        let breaker = manager
            .get_circuit(&name)
            .await
            .with_context(|| format!("Endpoint '{name}' disappeared from the registry"))?;
        let resolved = breaker.config().clone();
        endpoints.push(EndpointStatus {
            overridden: resolved != config.circuit_breaker,
            name,
            config: resolved,
        });
    }

    Ok(StatusOutput { endpoints })
}

pub async fn execute(config: &Config, json_mode: bool) -> Result<()> {
    let status = collect_status(config).await?;
    output(&status, json_mode);
    Ok(())
}
