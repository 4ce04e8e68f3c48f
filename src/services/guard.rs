//! Caller-side helper that runs a future under circuit breaker protection.
//!
//! The manager itself never runs guarded work; this wrapper performs the
//! admission check, awaits the operation and reports the outcome. Trial
//! requests admitted while the breaker is half-open are bounded by the
//! breaker's `test_request_timeout`.

use chrono::{DateTime, Utc};
use std::future::Future;

use super::circuit_breaker_manager::{CircuitBreakerManager, CircuitCheck};

/// Error from a circuit breaker protected operation.
#[derive(Debug)]
pub enum GuardError<E> {
    /// The circuit is open and blocking requests.
    CircuitOpen {
        name: String,
        retry_after: DateTime<Utc>,
    },
    /// A half-open trial request exceeded the test request timeout.
    TrialTimedOut {
        name: String,
        timeout: std::time::Duration,
    },
    /// The underlying operation failed.
    OperationFailed(E),
}

impl<E> GuardError<E> {
    /// Whether the operation was never attempted.
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::CircuitOpen { .. })
    }
}

impl<E: std::fmt::Display> std::fmt::Display for GuardError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CircuitOpen { name, retry_after } => {
                write!(f, "Circuit breaker open for '{name}', retry after {retry_after}")
            }
            Self::TrialTimedOut { name, timeout } => {
                write!(f, "Trial request to '{name}' timed out after {timeout:?}")
            }
            Self::OperationFailed(e) => write!(f, "Operation failed: {e}"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for GuardError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::CircuitOpen { .. } | Self::TrialTimedOut { .. } => None,
            Self::OperationFailed(e) => Some(e),
        }
    }
}

/// Execute `operation` with circuit breaker protection for `name`.
///
/// Unregistered names run unguarded (fail-open) and report nothing.
pub async fn with_circuit_breaker<F, T, E>(
    manager: &CircuitBreakerManager,
    name: &str,
    operation: F,
) -> Result<T, GuardError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    let result = match manager.check(name).await {
        CircuitCheck::Blocked { retry_after } => {
            return Err(GuardError::CircuitOpen {
                name: name.to_string(),
                retry_after,
            });
        }
        CircuitCheck::Testing { trial_timeout } => {
            if let Ok(result) = tokio::time::timeout(trial_timeout, operation).await {
                result
            } else {
                manager.record_failure(name).await;
                return Err(GuardError::TrialTimedOut {
                    name: name.to_string(),
                    timeout: trial_timeout,
                });
            }
        }
        CircuitCheck::Allowed | CircuitCheck::Unmanaged => operation.await,
    };

    match result {
        Ok(value) => {
            manager.record_success(name).await;
            Ok(value)
        }
        Err(e) => {
            manager.record_failure(name).await;
            Err(GuardError::OperationFailed(e))
        }
    }
}
