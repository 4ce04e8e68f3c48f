//! Registry of named circuit breakers.
//!
//! Callers register a resource once, ask [`CircuitBreakerManager::is_request_allowed`]
//! before each call and report the outcome with
//! [`CircuitBreakerManager::record_success`] or
//! [`CircuitBreakerManager::record_failure`]. Every public method holds the
//! registry mutex for its whole body, so lookup, mutation and state
//! re-evaluation form one atomic step per call.
//!
//! Log records and transition events produced under the lock are buffered and
//! emitted only after the guard is released.

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

use crate::domain::error::ConfigError;
use crate::domain::models::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerStats, CircuitState, CircuitSummary,
    CircuitTransition, TransitionCause,
};
use crate::domain::ports::{Clock, Level, Logger, SystemClock};
use crate::infrastructure::logging::TracingLogger;

/// Idle age after which `cleanup_inactive_circuits` removes a breaker by default.
pub const DEFAULT_MAX_INACTIVE_HOURS: u64 = 24;

/// Result of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CircuitCheck {
    /// The name is not registered; requests are always allowed.
    Unmanaged,
    /// The circuit is closed.
    Allowed,
    /// The circuit is half-open; the request is a recovery trial.
    Testing {
        /// Advisory bound for the trial request.
        trial_timeout: std::time::Duration,
    },
    /// The circuit is open.
    Blocked {
        /// Earliest time a trial request may be admitted.
        retry_after: DateTime<Utc>,
    },
}

impl CircuitCheck {
    pub const fn is_allowed(&self) -> bool {
        !self.is_blocked()
    }

    pub const fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked { .. })
    }
}

/// What prompted a state re-evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    Admission,
    Success,
    Failure,
}

struct LogRecord {
    level: Level,
    message: String,
    fields: HashMap<String, Value>,
}

/// Side effects collected while the registry lock is held.
#[derive(Default)]
struct Pending {
    logs: Vec<LogRecord>,
    transitions: Vec<CircuitTransition>,
}

impl Pending {
    fn log<const N: usize>(
        &mut self,
        level: Level,
        message: impl Into<String>,
        fields: [(&str, Value); N],
    ) {
        self.logs.push(LogRecord {
            level,
            message: message.into(),
            fields: fields
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        });
    }

    fn is_empty(&self) -> bool {
        self.logs.is_empty() && self.transitions.is_empty()
    }
}

/// Concurrency-safe registry of circuit breakers.
///
/// Construct one per process in the composition root and share it with
/// `Arc`; there is no global instance.
pub struct CircuitBreakerManager {
    default_config: CircuitBreakerConfig,
    breakers: Mutex<HashMap<String, CircuitBreaker>>,
    clock: Arc<dyn Clock>,
    logger: Arc<dyn Logger>,
    event_sender: Option<mpsc::Sender<CircuitTransition>>,
}

impl CircuitBreakerManager {
    /// Create a manager whose breakers default to `default_config`.
    pub fn new(default_config: CircuitBreakerConfig) -> Result<Self, ConfigError> {
        default_config.validate()?;
        Ok(Self::unchecked(default_config))
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::unchecked(CircuitBreakerConfig::default())
    }

    fn unchecked(default_config: CircuitBreakerConfig) -> Self {
        Self {
            default_config,
            breakers: Mutex::new(HashMap::new()),
            clock: Arc::new(SystemClock),
            logger: Arc::new(TracingLogger::new()),
            event_sender: None,
        }
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the logger.
    #[must_use]
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Publish every state transition on `sender`.
    ///
    /// Events are sent with `try_send`; a full or closed channel drops them.
    #[must_use]
    pub fn with_event_sender(mut self, sender: mpsc::Sender<CircuitTransition>) -> Self {
        self.event_sender = Some(sender);
        self
    }

    /// Configuration used when `register_endpoint` gets no explicit config.
    pub const fn default_config(&self) -> &CircuitBreakerConfig {
        &self.default_config
    }

    /// Register a resource. Registering an existing name is a no-op.
    pub async fn register_endpoint(
        &self,
        name: &str,
        config: Option<CircuitBreakerConfig>,
    ) -> Result<(), ConfigError> {
        if let Some(ref config) = config {
            config.validate()?;
        }

        let now = self.clock.now();
        let mut pending = Pending::default();
        {
            let mut breakers = self.breakers.lock().await;
            if breakers.contains_key(name) {
                pending.log(
                    Level::Warn,
                    "circuit breaker already registered",
                    [("endpoint", json!(name))],
                );
            } else {
                let config = config.unwrap_or_else(|| self.default_config.clone());
                pending.log(
                    Level::Debug,
                    "circuit breaker registered",
                    [
                        ("endpoint", json!(name)),
                        ("failure_threshold", json!(config.failure_threshold)),
                        ("recovery_timeout_secs", json!(config.recovery_timeout_secs)),
                    ],
                );
                breakers.insert(name.to_string(), CircuitBreaker::new(name, config, now));
            }
        }

        self.flush(pending).await;
        Ok(())
    }

    /// Evaluate the breaker for `name` and report whether a request may proceed.
    pub async fn check(&self, name: &str) -> CircuitCheck {
        let now = self.clock.now();
        let mut pending = Pending::default();
        let result = {
            let mut breakers = self.breakers.lock().await;
            let Some(breaker) = breakers.get_mut(name) else {
                return CircuitCheck::Unmanaged;
            };

            Self::update_circuit_state(breaker, Trigger::Admission, now, &mut pending);

            match breaker.state() {
                CircuitState::Closed => CircuitCheck::Allowed,
                CircuitState::HalfOpen => CircuitCheck::Testing {
                    trial_timeout: breaker.config().test_request_timeout(),
                },
                CircuitState::Open => CircuitCheck::Blocked {
                    retry_after: breaker
                        .last_state_change()
                        .checked_add_signed(breaker.config().recovery_timeout())
                        .unwrap_or(DateTime::<Utc>::MAX_UTC),
                },
            }
        };

        self.flush(pending).await;
        result
    }

    /// Whether a request to `name` may proceed. Unregistered names are allowed.
    pub async fn is_request_allowed(&self, name: &str) -> bool {
        self.check(name).await.is_allowed()
    }

    /// Report a successful call. Unregistered names are ignored.
    pub async fn record_success(&self, name: &str) {
        self.record(name, Trigger::Success).await;
    }

    /// Report a failed call. Unregistered names are ignored.
    pub async fn record_failure(&self, name: &str) {
        self.record(name, Trigger::Failure).await;
    }

    async fn record(&self, name: &str, trigger: Trigger) {
        let now = self.clock.now();
        let mut pending = Pending::default();
        {
            let mut breakers = self.breakers.lock().await;
            let Some(breaker) = breakers.get_mut(name) else {
                return;
            };

            match trigger {
                Trigger::Success => breaker.record_success(now),
                Trigger::Failure => breaker.record_failure(now),
                Trigger::Admission => {}
            }
            Self::update_circuit_state(breaker, trigger, now, &mut pending);
        }

        self.flush(pending).await;
    }

    /// Current state, without re-evaluating it.
    pub async fn get_circuit_state(&self, name: &str) -> Option<CircuitState> {
        self.breakers.lock().await.get(name).map(CircuitBreaker::state)
    }

    /// Copy of the breaker's counters.
    pub async fn get_circuit_stats(&self, name: &str) -> Option<CircuitBreakerStats> {
        self.breakers
            .lock()
            .await
            .get(name)
            .map(|breaker| breaker.stats().clone())
    }

    /// Detached copy of the whole breaker. Mutating it has no effect on the registry.
    pub async fn get_circuit(&self, name: &str) -> Option<CircuitBreaker> {
        self.breakers.lock().await.get(name).cloned()
    }

    /// Summary of every registered breaker.
    pub async fn get_all_circuits(&self) -> HashMap<String, CircuitSummary> {
        self.breakers
            .lock()
            .await
            .iter()
            .map(|(name, breaker)| (name.clone(), breaker.summary()))
            .collect()
    }

    /// Names of breakers currently open, sorted.
    pub async fn get_open_circuits(&self) -> Vec<String> {
        let mut open: Vec<String> = self
            .breakers
            .lock()
            .await
            .iter()
            .filter(|(_, breaker)| breaker.state() == CircuitState::Open)
            .map(|(name, _)| name.clone())
            .collect();
        open.sort();
        open
    }

    /// Number of registered breakers.
    pub async fn len(&self) -> usize {
        self.breakers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.breakers.lock().await.is_empty()
    }

    /// Open the circuit regardless of its counters.
    pub async fn force_open(&self, name: &str) -> bool {
        self.force(name, CircuitState::Open).await
    }

    /// Close the circuit regardless of its counters.
    pub async fn force_close(&self, name: &str) -> bool {
        self.force(name, CircuitState::Closed).await
    }

    async fn force(&self, name: &str, next: CircuitState) -> bool {
        let now = self.clock.now();
        let mut pending = Pending::default();
        {
            let mut breakers = self.breakers.lock().await;
            let Some(breaker) = breakers.get_mut(name) else {
                return false;
            };
            Self::transition(
                breaker,
                next,
                now,
                TransitionCause::Forced,
                Level::Warn,
                "circuit breaker state forced",
                &mut pending,
            );
        }

        self.flush(pending).await;
        true
    }

    /// Remove breakers with no reported outcome in the last `max_age_hours`.
    ///
    /// A breaker that never saw an outcome is aged from its last state change.
    /// Returns the number of breakers removed.
    pub async fn cleanup_inactive_circuits(&self, max_age_hours: u64) -> usize {
        let now = self.clock.now();
        let max_age = i64::try_from(max_age_hours)
            .ok()
            .and_then(Duration::try_hours)
            .unwrap_or(Duration::MAX);
        let Some(cutoff) = now.checked_sub_signed(max_age) else {
            return 0;
        };

        let mut removed = Vec::new();
        {
            let mut breakers = self.breakers.lock().await;
            breakers.retain(|name, breaker| {
                let keep = breaker.last_activity() >= cutoff;
                if !keep {
                    removed.push(name.clone());
                }
                keep
            });
        }

        if !removed.is_empty() {
            removed.sort();
            let mut fields = HashMap::new();
            fields.insert("removed".to_string(), json!(removed));
            fields.insert("max_age_hours".to_string(), json!(max_age_hours));
            self.logger
                .log(Level::Info, "removed inactive circuit breakers", fields)
                .await;
        }

        removed.len()
    }

    /// Apply the automatic transition table to one breaker.
    fn update_circuit_state(
        breaker: &mut CircuitBreaker,
        trigger: Trigger,
        now: DateTime<Utc>,
        pending: &mut Pending,
    ) {
        match breaker.state() {
            CircuitState::Closed => {
                if breaker.should_open() {
                    Self::transition(
                        breaker,
                        CircuitState::Open,
                        now,
                        TransitionCause::Automatic,
                        Level::Warn,
                        "circuit breaker opened",
                        pending,
                    );
                }
            }
            CircuitState::Open => {
                if breaker.should_attempt_reset(now) {
                    Self::transition(
                        breaker,
                        CircuitState::HalfOpen,
                        now,
                        TransitionCause::Automatic,
                        Level::Info,
                        "circuit breaker half-open, admitting trial requests",
                        pending,
                    );
                }
            }
            CircuitState::HalfOpen => {
                if breaker.should_close() {
                    Self::transition(
                        breaker,
                        CircuitState::Closed,
                        now,
                        TransitionCause::Automatic,
                        Level::Info,
                        "circuit breaker closed, resource recovered",
                        pending,
                    );
                } else if trigger == Trigger::Failure {
                    Self::transition(
                        breaker,
                        CircuitState::Open,
                        now,
                        TransitionCause::Automatic,
                        Level::Warn,
                        "circuit breaker re-opened, trial request failed",
                        pending,
                    );
                }
            }
        }
    }

    fn transition(
        breaker: &mut CircuitBreaker,
        next: CircuitState,
        now: DateTime<Utc>,
        cause: TransitionCause,
        level: Level,
        message: &str,
        pending: &mut Pending,
    ) {
        let from = breaker.transition_to(next, now);
        let stats = breaker.stats();
        pending.log(
            level,
            message,
            [
                ("endpoint", json!(breaker.name())),
                ("from", json!(from.as_str())),
                ("to", json!(next.as_str())),
                ("cause", json!(cause)),
                ("consecutive_failures", json!(stats.current_consecutive_failures)),
                ("failure_rate", json!(breaker.failure_rate())),
            ],
        );
        pending.transitions.push(CircuitTransition {
            name: breaker.name().to_string(),
            from,
            to: next,
            at: now,
            cause,
        });
    }

    async fn flush(&self, pending: Pending) {
        if pending.is_empty() {
            return;
        }

        for record in pending.logs {
            self.logger
                .log(record.level, &record.message, record.fields)
                .await;
        }

        if let Some(ref sender) = self.event_sender {
            for transition in pending.transitions {
                let _ = sender.try_send(transition);
            }
        }
    }
}

impl std::fmt::Debug for CircuitBreakerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreakerManager")
            .field("default_config", &self.default_config)
            .field("event_sender", &self.event_sender.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::ManualClock;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct RecordingLogger {
        entries: StdMutex<Vec<(Level, String, HashMap<String, Value>)>>,
    }

    impl RecordingLogger {
        fn messages(&self, level: Level) -> Vec<String> {
            self.entries
                .lock()
                .unwrap()
                .iter()
                .filter(|(l, _, _)| *l == level)
                .map(|(_, message, _)| message.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Logger for RecordingLogger {
        async fn log(&self, level: Level, message: &str, fields: HashMap<String, Value>) {
            self.entries
                .lock()
                .unwrap()
                .push((level, message.to_string(), fields));
        }
    }

    fn manager_with_clock() -> (CircuitBreakerManager, Arc<ManualClock>, Arc<RecordingLogger>) {
        let clock = Arc::new(ManualClock::starting_now());
        let logger = Arc::new(RecordingLogger::default());
        let manager = CircuitBreakerManager::with_defaults()
            .with_clock(clock.clone())
            .with_logger(logger.clone());
        (manager, clock, logger)
    }

    fn config(failure_threshold: u32, success_threshold: u32) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold,
            success_threshold,
            recovery_timeout_secs: 30,
            ..Default::default()
        }
    }

    #[test]
    fn test_new_rejects_invalid_default() {
        let result = CircuitBreakerManager::new(CircuitBreakerConfig {
            failure_threshold: 0,
            ..Default::default()
        });
        assert!(matches!(
            result,
            Err(ConfigError::InvalidFailureThreshold(0))
        ));
    }

    #[tokio::test]
    async fn test_with_defaults_matches_new_with_default_config() {
        let defaulted = CircuitBreakerManager::with_defaults();
        let explicit = CircuitBreakerManager::new(CircuitBreakerConfig::default()).unwrap();

        assert_eq!(defaulted.default_config(), explicit.default_config());
        assert!(defaulted.is_empty().await);
        assert!(explicit.is_empty().await);
        assert_eq!(format!("{defaulted:?}"), format!("{explicit:?}"));
    }

    #[test]
    fn test_check_result_methods() {
        assert!(CircuitCheck::Unmanaged.is_allowed());
        assert!(CircuitCheck::Allowed.is_allowed());
        let testing = CircuitCheck::Testing {
            trial_timeout: std::time::Duration::from_secs(5),
        };
        assert!(testing.is_allowed());
        assert!(!testing.is_blocked());
        let blocked = CircuitCheck::Blocked {
            retry_after: Utc::now(),
        };
        assert!(blocked.is_blocked());
        assert!(!blocked.is_allowed());
    }

    #[tokio::test]
    async fn test_opens_after_consecutive_failures() {
        let (manager, _clock, logger) = manager_with_clock();
        manager.register_endpoint("svc", Some(config(3, 1))).await.unwrap();

        manager.record_failure("svc").await;
        manager.record_failure("svc").await;
        assert_eq!(manager.get_circuit_state("svc").await, Some(CircuitState::Closed));
        assert!(manager.is_request_allowed("svc").await);

        manager.record_failure("svc").await;
        assert_eq!(manager.get_circuit_state("svc").await, Some(CircuitState::Open));
        assert!(!manager.is_request_allowed("svc").await);
        assert_eq!(logger.messages(Level::Warn), vec!["circuit breaker opened"]);
    }

    #[tokio::test]
    async fn test_success_interrupts_failure_streak() {
        let (manager, _clock, _logger) = manager_with_clock();
        manager.register_endpoint("svc", Some(config(3, 1))).await.unwrap();

        manager.record_failure("svc").await;
        manager.record_failure("svc").await;
        manager.record_success("svc").await;
        manager.record_failure("svc").await;
        manager.record_failure("svc").await;

        assert_eq!(manager.get_circuit_state("svc").await, Some(CircuitState::Closed));
        let stats = manager.get_circuit_stats("svc").await.unwrap();
        assert_eq!(stats.current_consecutive_failures, 2);
        assert_eq!(stats.total_requests, 5);
    }

    #[tokio::test]
    async fn test_unregistered_names_fail_open() {
        let (manager, _clock, logger) = manager_with_clock();

        assert!(manager.is_request_allowed("never_registered").await);
        assert_eq!(manager.check("never_registered").await, CircuitCheck::Unmanaged);
        manager.record_success("never_registered").await;
        manager.record_failure("never_registered").await;

        assert!(manager.get_all_circuits().await.is_empty());
        assert!(manager.is_empty().await);
        assert_eq!(manager.get_circuit_state("never_registered").await, None);
        assert!(manager.get_circuit_stats("never_registered").await.is_none());
        assert!(!manager.force_open("never_registered").await);
        assert!(!manager.force_close("never_registered").await);
        assert!(logger.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let (manager, _clock, logger) = manager_with_clock();
        manager.register_endpoint("x", None).await.unwrap();
        manager.record_failure("x").await;

        manager.register_endpoint("x", Some(config(1, 1))).await.unwrap();

        assert_eq!(manager.len().await, 1);
        let stats = manager.get_circuit_stats("x").await.unwrap();
        assert_eq!(stats.failed_requests, 1);
        // The second registration's config was not applied
        assert_eq!(manager.get_circuit_state("x").await, Some(CircuitState::Closed));
        assert_eq!(
            logger.messages(Level::Warn),
            vec!["circuit breaker already registered"]
        );
    }

    #[tokio::test]
    async fn test_register_uses_manager_default() {
        let manager = CircuitBreakerManager::new(config(2, 1))
            .unwrap()
            .with_logger(Arc::new(crate::domain::ports::NullLogger));
        manager.register_endpoint("svc", None).await.unwrap();

        let breaker = manager.get_circuit("svc").await.unwrap();
        assert_eq!(breaker.config(), manager.default_config());
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_config() {
        let (manager, _clock, _logger) = manager_with_clock();
        let result = manager
            .register_endpoint(
                "svc",
                Some(CircuitBreakerConfig {
                    success_threshold: 0,
                    ..Default::default()
                }),
            )
            .await;

        assert!(matches!(result, Err(ConfigError::InvalidSuccessThreshold(0))));
        assert!(manager.is_empty().await);
    }

    #[tokio::test]
    async fn test_recovery_cycle() {
        let (manager, clock, _logger) = manager_with_clock();
        manager.register_endpoint("svc", Some(config(2, 2))).await.unwrap();
        manager.record_failure("svc").await;
        manager.record_failure("svc").await;
        assert!(!manager.is_request_allowed("svc").await);

        clock.advance(Duration::seconds(29));
        assert!(!manager.is_request_allowed("svc").await);

        clock.advance(Duration::seconds(1));
        assert!(manager.is_request_allowed("svc").await);
        assert_eq!(manager.get_circuit_state("svc").await, Some(CircuitState::HalfOpen));

        manager.record_success("svc").await;
        assert_eq!(manager.get_circuit_state("svc").await, Some(CircuitState::HalfOpen));
        manager.record_success("svc").await;
        assert_eq!(manager.get_circuit_state("svc").await, Some(CircuitState::Closed));

        let stats = manager.get_circuit_stats("svc").await.unwrap();
        assert_eq!(stats.state_changes, 3);
        assert_eq!(stats.current_consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_blocked_check_reports_retry_after() {
        let (manager, clock, _logger) = manager_with_clock();
        manager.register_endpoint("svc", Some(config(1, 1))).await.unwrap();
        let opened_at = clock.now();
        manager.record_failure("svc").await;

        match manager.check("svc").await {
            CircuitCheck::Blocked { retry_after } => {
                assert_eq!(retry_after, opened_at + Duration::seconds(30));
            }
            other => panic!("expected Blocked, got {other:?}"),
        }

        clock.advance(Duration::seconds(30));
        assert_eq!(
            manager.check("svc").await,
            CircuitCheck::Testing {
                trial_timeout: std::time::Duration::from_secs(5)
            }
        );
    }

    #[tokio::test]
    async fn test_half_open_failure_reopens_and_resets_clock() {
        let (manager, clock, _logger) = manager_with_clock();
        manager.register_endpoint("svc", Some(config(5, 3))).await.unwrap();
        assert!(manager.force_open("svc").await);

        clock.advance(Duration::seconds(30));
        assert!(manager.is_request_allowed("svc").await);
        manager.record_success("svc").await;
        assert_eq!(manager.get_circuit_state("svc").await, Some(CircuitState::HalfOpen));

        let failed_at = clock.now();
        manager.record_failure("svc").await;
        assert_eq!(manager.get_circuit_state("svc").await, Some(CircuitState::Open));
        let breaker = manager.get_circuit("svc").await.unwrap();
        assert_eq!(breaker.last_state_change(), failed_at);

        // Recovery timeout restarts from the re-open
        clock.advance(Duration::seconds(29));
        assert!(!manager.is_request_allowed("svc").await);
        clock.advance(Duration::seconds(1));
        assert!(manager.is_request_allowed("svc").await);
    }

    #[tokio::test]
    async fn test_half_open_ignores_stale_failures_on_admission() {
        let (manager, clock, _logger) = manager_with_clock();
        manager.register_endpoint("svc", Some(config(2, 3))).await.unwrap();
        manager.record_failure("svc").await;
        manager.record_failure("svc").await;

        clock.advance(Duration::seconds(30));
        assert!(manager.is_request_allowed("svc").await);
        // The carried-over failure streak must not re-open the trial
        assert!(manager.is_request_allowed("svc").await);
        assert_eq!(manager.get_circuit_state("svc").await, Some(CircuitState::HalfOpen));
    }

    #[tokio::test]
    async fn test_rate_path_opens_circuit() {
        let (manager, _clock, _logger) = manager_with_clock();
        let config = CircuitBreakerConfig {
            failure_threshold: 100,
            minimum_requests: 4,
            rolling_window_size: 10,
            ..Default::default()
        };
        manager.register_endpoint("svc", Some(config)).await.unwrap();

        for outcome in [false, true, false, true] {
            if outcome {
                manager.record_success("svc").await;
            } else {
                manager.record_failure("svc").await;
            }
        }
        assert_eq!(manager.get_circuit_state("svc").await, Some(CircuitState::Closed));

        manager.record_failure("svc").await;
        assert_eq!(manager.get_circuit_state("svc").await, Some(CircuitState::Open));
    }

    #[tokio::test]
    async fn test_failure_rate_floor_keeps_fresh_breaker_closed() {
        let (manager, _clock, _logger) = manager_with_clock();
        manager.register_endpoint("svc", None).await.unwrap();
        manager.record_failure("svc").await;

        let summary = manager.get_all_circuits().await.remove("svc").unwrap();
        assert!(summary.failure_rate.abs() < f64::EPSILON);
        assert_eq!(summary.state, CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_idle_breaker_stays_closed() {
        let (manager, clock, _logger) = manager_with_clock();
        manager.register_endpoint("svc", None).await.unwrap();
        clock.advance(Duration::days(3));
        assert!(manager.is_request_allowed("svc").await);
        assert_eq!(manager.get_circuit_state("svc").await, Some(CircuitState::Closed));
        assert_eq!(manager.get_circuit_stats("svc").await.unwrap().state_changes, 0);
    }

    #[tokio::test]
    async fn test_force_open_and_close() {
        let (manager, clock, logger) = manager_with_clock();
        manager.register_endpoint("svc", Some(config(5, 1))).await.unwrap();

        assert!(manager.force_open("svc").await);
        assert_eq!(manager.get_circuit_state("svc").await, Some(CircuitState::Open));
        assert!(!manager.is_request_allowed("svc").await);
        assert_eq!(manager.get_open_circuits().await, vec!["svc".to_string()]);

        clock.advance(Duration::seconds(5));
        let closed_at = clock.now();
        assert!(manager.force_close("svc").await);
        assert_eq!(manager.get_circuit_state("svc").await, Some(CircuitState::Closed));
        assert!(manager.is_request_allowed("svc").await);

        let breaker = manager.get_circuit("svc").await.unwrap();
        assert_eq!(breaker.last_state_change(), closed_at);
        assert_eq!(breaker.stats().state_changes, 2);
        assert_eq!(logger.messages(Level::Warn).len(), 2);
    }

    #[tokio::test]
    async fn test_forced_open_recovers_after_timeout() {
        let (manager, clock, _logger) = manager_with_clock();
        manager.register_endpoint("svc", Some(config(5, 1))).await.unwrap();
        clock.advance(Duration::seconds(100));
        manager.force_open("svc").await;

        clock.advance(Duration::seconds(29));
        assert!(!manager.is_request_allowed("svc").await);
        clock.advance(Duration::seconds(1));
        assert!(manager.is_request_allowed("svc").await);
        manager.record_success("svc").await;
        assert_eq!(manager.get_circuit_state("svc").await, Some(CircuitState::Closed));
    }

    #[tokio::test]
    async fn test_cleanup_inactive_circuits() {
        let (manager, clock, logger) = manager_with_clock();
        manager.register_endpoint("stale", None).await.unwrap();
        manager.register_endpoint("never_used", None).await.unwrap();
        manager.register_endpoint("active", None).await.unwrap();
        manager.record_success("stale").await;

        clock.advance(Duration::hours(23));
        manager.record_failure("active").await;
        clock.advance(Duration::hours(2));

        let removed = manager
            .cleanup_inactive_circuits(DEFAULT_MAX_INACTIVE_HOURS)
            .await;
        assert_eq!(removed, 2);
        assert_eq!(manager.len().await, 1);
        assert!(manager.get_circuit_state("active").await.is_some());
        assert_eq!(
            logger.messages(Level::Info),
            vec!["removed inactive circuit breakers"]
        );

        // Removed breakers behave as unregistered
        manager.record_failure("stale").await;
        assert!(manager.is_request_allowed("stale").await);
        assert!(manager.get_circuit_state("stale").await.is_none());
    }

    #[tokio::test]
    async fn test_cleanup_with_huge_age_removes_nothing() {
        let (manager, clock, _logger) = manager_with_clock();
        manager.register_endpoint("svc", None).await.unwrap();
        clock.advance(Duration::days(365));
        assert_eq!(manager.cleanup_inactive_circuits(u64::MAX).await, 0);
        assert_eq!(manager.cleanup_inactive_circuits(0).await, 1);
    }

    #[tokio::test]
    async fn test_transition_events() {
        let (tx, mut rx) = mpsc::channel(10);
        let clock = Arc::new(ManualClock::starting_now());
        let manager = CircuitBreakerManager::with_defaults()
            .with_clock(clock.clone())
            .with_logger(Arc::new(crate::domain::ports::NullLogger))
            .with_event_sender(tx);
        manager.register_endpoint("svc", Some(config(1, 1))).await.unwrap();

        manager.record_success("svc").await;
        assert!(rx.try_recv().is_err());

        manager.record_failure("svc").await;
        let event = rx.try_recv().unwrap();
        assert_eq!(event.name, "svc");
        assert_eq!(event.from, CircuitState::Closed);
        assert_eq!(event.to, CircuitState::Open);
        assert_eq!(event.cause, TransitionCause::Automatic);
        assert_eq!(event.at, clock.now());

        manager.force_close("svc").await;
        let event = rx.try_recv().unwrap();
        assert_eq!(event.to, CircuitState::Closed);
        assert_eq!(event.cause, TransitionCause::Forced);
    }

    #[tokio::test]
    async fn test_full_event_channel_does_not_block() {
        let (tx, _rx) = mpsc::channel(1);
        let manager = CircuitBreakerManager::with_defaults()
            .with_logger(Arc::new(crate::domain::ports::NullLogger))
            .with_event_sender(tx);
        manager.register_endpoint("svc", None).await.unwrap();

        for _ in 0..5 {
            manager.force_open("svc").await;
        }
        assert_eq!(manager.get_circuit_stats("svc").await.unwrap().state_changes, 5);
    }

    #[tokio::test]
    async fn test_get_all_circuits_summary() {
        let (manager, _clock, _logger) = manager_with_clock();
        manager.register_endpoint("a", None).await.unwrap();
        manager.register_endpoint("b", Some(config(1, 1))).await.unwrap();
        manager.record_success("a").await;
        manager.record_failure("b").await;

        let circuits = manager.get_all_circuits().await;
        assert_eq!(circuits.len(), 2);
        assert_eq!(circuits["a"].state, CircuitState::Closed);
        assert_eq!(circuits["a"].stats.successful_requests, 1);
        assert_eq!(circuits["b"].state, CircuitState::Open);
        assert_eq!(circuits["b"].stats.consecutive_failures, 1);
    }
}
