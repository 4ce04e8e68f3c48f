//! Circuit breaker state and rolling statistics for a single protected resource.
//!
//! A [`CircuitBreaker`] performs no locking and no I/O. Every instance is owned
//! by the manager in `services::circuit_breaker_manager`, which serializes access
//! and is the only caller of the transition function.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::domain::error::ConfigError;

/// State of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Circuit is closed, requests flow normally.
    Closed,
    /// Circuit is open, requests are blocked.
    Open,
    /// Circuit is testing if the resource has recovered.
    HalfOpen,
}

impl CircuitState {
    /// Stable lowercase name, matching the serialized form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }

    /// Whether a breaker in this state admits requests.
    pub const fn allows_requests(&self) -> bool {
        !matches!(self, Self::Open)
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for one circuit breaker, fixed at registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that force `Closed -> Open`.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Minimum time in seconds spent `Open` before a trial is allowed.
    #[serde(default = "default_recovery_timeout_secs")]
    pub recovery_timeout_secs: u64,

    /// Upper bound in seconds for a single trial request. Not enforced by the
    /// manager; see `services::guard`.
    #[serde(default = "default_test_request_timeout_secs")]
    pub test_request_timeout_secs: u64,

    /// Consecutive successes in `HalfOpen` required to close the circuit.
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,

    /// Number of most recent outcomes kept for the failure rate.
    #[serde(default = "default_rolling_window_size")]
    pub rolling_window_size: usize,

    /// Below this many samples the failure rate reads as 0.0.
    #[serde(default = "default_minimum_requests")]
    pub minimum_requests: usize,

    /// Failure rate strictly above which the circuit opens.
    #[serde(default = "default_failure_rate_threshold")]
    pub failure_rate_threshold: f64,
}

const fn default_failure_threshold() -> u32 {
    5
}

const fn default_recovery_timeout_secs() -> u64 {
    60
}

const fn default_test_request_timeout_secs() -> u64 {
    5
}

const fn default_success_threshold() -> u32 {
    3
}

const fn default_rolling_window_size() -> usize {
    100
}

const fn default_minimum_requests() -> usize {
    10
}

const fn default_failure_rate_threshold() -> f64 {
    0.5
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout_secs: default_recovery_timeout_secs(),
            test_request_timeout_secs: default_test_request_timeout_secs(),
            success_threshold: default_success_threshold(),
            rolling_window_size: default_rolling_window_size(),
            minimum_requests: default_minimum_requests(),
            failure_rate_threshold: default_failure_rate_threshold(),
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a more sensitive circuit breaker.
    pub fn sensitive() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout_secs: 30,
            success_threshold: 1,
            minimum_requests: 5,
            ..Default::default()
        }
    }

    /// Create a more resilient circuit breaker.
    pub fn resilient() -> Self {
        Self {
            failure_threshold: 10,
            recovery_timeout_secs: 300,
            success_threshold: 5,
            rolling_window_size: 200,
            minimum_requests: 20,
            ..Default::default()
        }
    }

    /// Dwell time in `Open` before a trial request is admitted.
    pub fn recovery_timeout(&self) -> Duration {
        i64::try_from(self.recovery_timeout_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }

    /// Upper bound for a single trial request.
    pub const fn test_request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.test_request_timeout_secs)
    }

    /// Reject configurations the state machine cannot operate on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.failure_threshold == 0 {
            return Err(ConfigError::InvalidFailureThreshold(self.failure_threshold));
        }

        if self.success_threshold == 0 {
            return Err(ConfigError::InvalidSuccessThreshold(self.success_threshold));
        }

        if self.rolling_window_size == 0 {
            return Err(ConfigError::InvalidRollingWindowSize(
                self.rolling_window_size,
            ));
        }

        if self.minimum_requests == 0 {
            return Err(ConfigError::InvalidMinimumRequests(self.minimum_requests));
        }

        // The rate path could never engage otherwise.
        if self.minimum_requests > self.rolling_window_size {
            return Err(ConfigError::MinimumRequestsExceedsWindow {
                minimum_requests: self.minimum_requests,
                rolling_window_size: self.rolling_window_size,
            });
        }

        if !self.failure_rate_threshold.is_finite()
            || self.failure_rate_threshold <= 0.0
            || self.failure_rate_threshold > 1.0
        {
            return Err(ConfigError::InvalidFailureRateThreshold(
                self.failure_rate_threshold,
            ));
        }

        Ok(())
    }
}

/// Lifetime and streak counters for one circuit breaker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CircuitBreakerStats {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub successful_requests: u64,
    /// Number of state transitions, forced ones included.
    pub state_changes: u64,
    pub last_failure_time: Option<DateTime<Utc>>,
    pub last_success_time: Option<DateTime<Utc>>,
    pub current_consecutive_failures: u32,
    pub current_consecutive_successes: u32,
}

/// Counters included in a [`CircuitSummary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CircuitStatsSummary {
    pub total_requests: u64,
    pub failed_requests: u64,
    pub successful_requests: u64,
    pub consecutive_failures: u32,
    pub consecutive_successes: u32,
}

/// Point-in-time view of one breaker, used for dashboards and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitSummary {
    pub state: CircuitState,
    pub failure_rate: f64,
    pub stats: CircuitStatsSummary,
}

/// What caused a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionCause {
    /// Predicate-driven transition during admission or outcome reporting.
    Automatic,
    /// Administrative `force_open` / `force_close`.
    Forced,
}

/// Event emitted whenever a breaker changes state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CircuitTransition {
    pub name: String,
    pub from: CircuitState,
    pub to: CircuitState,
    pub at: DateTime<Utc>,
    pub cause: TransitionCause,
}

/// Per-resource circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    state: CircuitState,
    stats: CircuitBreakerStats,
    last_state_change: DateTime<Utc>,
    /// Most recent outcomes, oldest first. `true` is a success.
    recent_results: VecDeque<bool>,
}

impl CircuitBreaker {
    /// Create a closed circuit breaker.
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig, now: DateTime<Utc>) -> Self {
        let capacity = config.rolling_window_size;
        Self {
            name: name.into(),
            config,
            state: CircuitState::Closed,
            stats: CircuitBreakerStats::default(),
            last_state_change: now,
            recent_results: VecDeque::with_capacity(capacity),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    pub const fn state(&self) -> CircuitState {
        self.state
    }

    pub const fn stats(&self) -> &CircuitBreakerStats {
        &self.stats
    }

    pub const fn last_state_change(&self) -> DateTime<Utc> {
        self.last_state_change
    }

    /// Outcomes currently inside the rolling window, oldest first.
    pub const fn recent_results(&self) -> &VecDeque<bool> {
        &self.recent_results
    }

    /// Record a successful request.
    pub fn record_success(&mut self, now: DateTime<Utc>) {
        self.stats.total_requests += 1;
        self.stats.successful_requests += 1;
        self.stats.current_consecutive_successes =
            self.stats.current_consecutive_successes.saturating_add(1);
        self.stats.current_consecutive_failures = 0;
        self.stats.last_success_time = Some(now);
        self.push_result(true);
    }

    /// Record a failed request.
    pub fn record_failure(&mut self, now: DateTime<Utc>) {
        self.stats.total_requests += 1;
        self.stats.failed_requests += 1;
        self.stats.current_consecutive_failures =
            self.stats.current_consecutive_failures.saturating_add(1);
        self.stats.current_consecutive_successes = 0;
        self.stats.last_failure_time = Some(now);
        self.push_result(false);
    }

    fn push_result(&mut self, success: bool) {
        self.recent_results.push_back(success);
        while self.recent_results.len() > self.config.rolling_window_size {
            self.recent_results.pop_front();
        }
    }

    /// Failure rate over the rolling window, 0.0 below `minimum_requests`.
    #[allow(clippy::cast_precision_loss)]
    pub fn failure_rate(&self) -> f64 {
        let samples = self.recent_results.len();
        if samples == 0 || samples < self.config.minimum_requests {
            return 0.0;
        }
        let failures = self.recent_results.iter().filter(|ok| !**ok).count();
        failures as f64 / samples as f64
    }

    /// Whether the failure counters justify opening the circuit.
    pub fn should_open(&self) -> bool {
        self.stats.current_consecutive_failures >= self.config.failure_threshold
            || self.failure_rate() > self.config.failure_rate_threshold
    }

    /// Whether an open circuit has waited long enough to admit a trial.
    pub fn should_attempt_reset(&self, now: DateTime<Utc>) -> bool {
        self.state == CircuitState::Open
            && now.signed_duration_since(self.last_state_change) >= self.config.recovery_timeout()
    }

    /// Whether a half-open circuit has seen enough successes to close.
    pub fn should_close(&self) -> bool {
        self.state == CircuitState::HalfOpen
            && self.stats.current_consecutive_successes >= self.config.success_threshold
    }

    /// Most recent reported outcome, or the last transition if nothing was reported.
    pub fn last_activity(&self) -> DateTime<Utc> {
        match (self.stats.last_success_time, self.stats.last_failure_time) {
            (Some(success), Some(failure)) => success.max(failure),
            (Some(at), None) | (None, Some(at)) => at,
            (None, None) => self.last_state_change,
        }
    }

    /// Snapshot used by `get_all_circuits`.
    pub fn summary(&self) -> CircuitSummary {
        CircuitSummary {
            state: self.state,
            failure_rate: self.failure_rate(),
            stats: CircuitStatsSummary {
                total_requests: self.stats.total_requests,
                failed_requests: self.stats.failed_requests,
                successful_requests: self.stats.successful_requests,
                consecutive_failures: self.stats.current_consecutive_failures,
                consecutive_successes: self.stats.current_consecutive_successes,
            },
        }
    }

    /// Move to `next`, returning the previous state.
    pub(crate) fn transition_to(&mut self, next: CircuitState, now: DateTime<Utc>) -> CircuitState {
        let previous = self.state;
        self.state = next;
        self.last_state_change = now;
        self.stats.state_changes += 1;

        match next {
            CircuitState::HalfOpen => self.stats.current_consecutive_successes = 0,
            CircuitState::Closed => self.stats.current_consecutive_failures = 0,
            CircuitState::Open => {}
        }

        previous
    }
}
