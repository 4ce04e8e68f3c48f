//! Implementation of the `tripwire simulate` command.
//!
//! Replays a success/failure sequence against a single breaker on a manual
//! clock, so thresholds and timeouts from the configuration can be tried out
//! without a real upstream.

use anyhow::{bail, Context, Result};
use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::cli::display::{circuit_table, list_table, render_list};
use crate::cli::output::{output, CommandOutput};
use crate::cli::types::SimulateArgs;
use crate::domain::models::{CircuitState, CircuitSummary, CircuitTransition, Config};
use crate::domain::ports::ManualClock;
use crate::infrastructure::logging::TracingLogger;
use crate::services::CircuitBreakerManager;

/// One reported outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
}

impl Outcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
        }
    }
}

/// Parse an `s`/`f` sequence. Commas and whitespace are ignored.
pub fn parse_outcomes(input: &str) -> Result<Vec<Outcome>> {
    let mut outcomes = Vec::new();
    for (position, c) in input.chars().enumerate() {
        match c.to_ascii_lowercase() {
            's' => outcomes.push(Outcome::Success),
            'f' => outcomes.push(Outcome::Failure),
            ',' => {}
            c if c.is_whitespace() => {}
            other => bail!("Invalid outcome '{other}' at position {position}; expected 's' or 'f'"),
        }
    }
    if outcomes.is_empty() {
        bail!("Outcome sequence is empty");
    }
    Ok(outcomes)
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationStep {
    pub step: usize,
    pub outcome: Outcome,
    /// Whether the admission check let the request through.
    pub admitted: bool,
    pub state_after: CircuitState,
}

#[derive(Debug, Serialize)]
pub struct SimulateOutput {
    pub endpoint: String,
    pub steps: Vec<SimulationStep>,
    pub blocked: usize,
    pub transitions: Vec<CircuitTransition>,
    pub summary: CircuitSummary,
}

impl CommandOutput for SimulateOutput {
    fn to_human(&self) -> String {
        let mut steps = list_table(&["step", "outcome", "admitted", "state"]);
        for step in &self.steps {
            steps.add_row(vec![
                step.step.to_string(),
                step.outcome.as_str().to_string(),
                if step.admitted { "yes" } else { "blocked" }.to_string(),
                step.state_after.as_str().to_string(),
            ]);
        }

        let mut lines = vec![render_list("step", &steps, self.steps.len())];
        if !self.transitions.is_empty() {
            lines.push(String::new());
            lines.push("Transitions:".to_string());
            for transition in &self.transitions {
                lines.push(format!("  {} -> {}", transition.from, transition.to));
            }
        }
        lines.push(String::new());
        lines.push(format!("Blocked requests: {}", self.blocked));
        lines.push(circuit_table([(self.endpoint.as_str(), &self.summary)]).to_string());
        lines.join("\n")
    }
}

/// Replay `outcomes` against a fresh breaker for `endpoint`.
pub async fn simulate(
    config: &Config,
    endpoint: &str,
    outcomes: &[Outcome],
    step: Duration,
) -> Result<SimulateOutput> {
    let breaker_config = config
        .endpoints
        .iter()
        .find(|e| e.name == endpoint)
        .map_or_else(
            || config.circuit_breaker.clone(),
            |e| e.resolve(&config.circuit_breaker),
        );

    let clock = Arc::new(ManualClock::starting_now());
    let (tx, mut rx) = mpsc::channel(outcomes.len().saturating_mul(2).max(1));
    let manager = CircuitBreakerManager::new(config.circuit_breaker.clone())
        .context("Invalid default circuit breaker configuration")?
        .with_clock(clock.clone())
        .with_logger(Arc::new(TracingLogger::new()))
        .with_event_sender(tx);
    manager
        .register_endpoint(endpoint, Some(breaker_config))
        .await
        .with_context(|| format!("Invalid configuration for endpoint '{endpoint}'"))?;

    let mut steps = Vec::with_capacity(outcomes.len());
    let mut blocked = 0;
    for (index, outcome) in outcomes.iter().copied().enumerate() {
        let admitted = manager.is_request_allowed(endpoint).await;
        if admitted {
            match outcome {
                Outcome::Success => manager.record_success(endpoint).await,
                Outcome::Failure => manager.record_failure(endpoint).await,
            }
        } else {
            blocked += 1;
        }

        steps.push(SimulationStep {
            step: index + 1,
            outcome,
            admitted,
            state_after: manager
                .get_circuit_state(endpoint)
                .await
                .unwrap_or(CircuitState::Closed),
        });
        if clock.advance(step).is_none() {
            bail!(
                "Simulated clock overflowed after step {}; use a smaller --step-secs",
                index + 1
            );
        }
    }

    let summary = manager
        .get_all_circuits()
        .await
        .remove(endpoint)
        .context("Simulated endpoint disappeared from the registry")?;

    let mut transitions = Vec::new();
    while let Ok(transition) = rx.try_recv() {
        transitions.push(transition);
    }

    Ok(SimulateOutput {
        endpoint: endpoint.to_string(),
        steps,
        blocked,
        transitions,
        summary,
    })
}

pub async fn execute(args: SimulateArgs, config: &Config, json_mode: bool) -> Result<()> {
    let outcomes = parse_outcomes(&args.outcomes)?;
    let step = Duration::try_seconds(i64::try_from(args.step_secs).unwrap_or(i64::MAX))
        .context("--step-secs is out of range")?;
    let result = simulate(config, &args.endpoint, &outcomes, step).await?;
    output(&result, json_mode);
    Ok(())
}
