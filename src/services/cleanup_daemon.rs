//! Inactive circuit cleanup background daemon.
//!
//! Periodically calls `cleanup_inactive_circuits` so breakers for resources
//! that stopped receiving traffic do not accumulate. The manager never spawns
//! this on its own; the composition root decides whether to run it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify, RwLock};
use tokio::time::{interval, Instant, MissedTickBehavior};

use crate::domain::models::CleanupConfig;
use crate::services::circuit_breaker_manager::{
    CircuitBreakerManager, DEFAULT_MAX_INACTIVE_HOURS,
};

/// Configuration for the cleanup daemon.
#[derive(Debug, Clone)]
pub struct CleanupDaemonConfig {
    /// Interval between cleanup passes.
    pub interval: Duration,
    /// Breakers idle for longer than this many hours are removed.
    pub max_age_hours: u64,
    /// Whether to run a pass immediately on startup.
    pub run_on_startup: bool,
}

impl Default for CleanupDaemonConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            max_age_hours: DEFAULT_MAX_INACTIVE_HOURS,
            run_on_startup: false,
        }
    }
}

impl From<&CleanupConfig> for CleanupDaemonConfig {
    fn from(config: &CleanupConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            max_age_hours: config.max_age_hours,
            run_on_startup: false,
        }
    }
}

/// Event emitted by the cleanup daemon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupEvent {
    /// Daemon started.
    Started,
    /// A cleanup pass finished.
    PassCompleted { run_number: u64, removed: usize },
    /// Daemon stopped.
    Stopped,
}

/// Status of the cleanup daemon.
#[derive(Debug, Clone, Default)]
pub struct DaemonStatus {
    /// Whether the daemon is running.
    pub running: bool,
    /// Total cleanup passes.
    pub total_runs: u64,
    /// Total breakers removed.
    pub total_removed: u64,
    /// Last pass time.
    pub last_run: Option<Instant>,
}

/// Handle to control the cleanup daemon.
#[derive(Clone)]
pub struct DaemonHandle {
    stop_flag: Arc<AtomicBool>,
    wake: Arc<Notify>,
    status: Arc<RwLock<DaemonStatus>>,
}

impl DaemonHandle {
    /// Request the daemon to stop. Takes effect without waiting for the next tick.
    pub fn stop(&self) {
        self.stop_flag.store(true, Ordering::Release);
        self.wake.notify_one();
    }

    /// Check if stop was requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_flag.load(Ordering::Acquire)
    }

    /// Get current daemon status.
    pub async fn status(&self) -> DaemonStatus {
        self.status.read().await.clone()
    }
}

/// Periodic cleanup of inactive circuit breakers.
pub struct CleanupDaemon {
    manager: Arc<CircuitBreakerManager>,
    config: CleanupDaemonConfig,
    status: Arc<RwLock<DaemonStatus>>,
    stop_flag: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

impl CleanupDaemon {
    /// Create a new cleanup daemon.
    pub fn new(manager: Arc<CircuitBreakerManager>, config: CleanupDaemonConfig) -> Self {
        Self {
            manager,
            config,
            status: Arc::new(RwLock::new(DaemonStatus::default())),
            stop_flag: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
        }
    }

    /// Get a handle to control the daemon.
    pub fn handle(&self) -> DaemonHandle {
        DaemonHandle {
            stop_flag: self.stop_flag.clone(),
            wake: self.wake.clone(),
            status: self.status.clone(),
        }
    }

    /// Spawn the daemon, returning a channel for its events.
    pub fn run(self) -> mpsc::Receiver<CleanupEvent> {
        let (tx, rx) = mpsc::channel(100);

        tokio::spawn(async move {
            self.run_loop(tx).await;
        });

        rx
    }

    async fn run_loop(self, tx: mpsc::Sender<CleanupEvent>) {
        self.status.write().await.running = true;
        let _ = tx.send(CleanupEvent::Started).await;
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            max_age_hours = self.config.max_age_hours,
            "circuit cleanup daemon started"
        );

        let mut timer = interval(self.config.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        timer.tick().await;

        if self.config.run_on_startup {
            self.run_pass(&tx).await;
        }

        while !self.stop_flag.load(Ordering::Acquire) {
            tokio::select! {
                _ = timer.tick() => {
                    if self.stop_flag.load(Ordering::Acquire) {
                        break;
                    }
                    self.run_pass(&tx).await;
                }
                () = self.wake.notified() => {}
            }
        }

        self.status.write().await.running = false;
        tracing::info!("circuit cleanup daemon stopped");
        let _ = tx.send(CleanupEvent::Stopped).await;
    }

    async fn run_pass(&self, tx: &mpsc::Sender<CleanupEvent>) {
        let removed = self
            .manager
            .cleanup_inactive_circuits(self.config.max_age_hours)
            .await;

        let run_number = {
            let mut status = self.status.write().await;
            status.total_runs += 1;
            status.total_removed += removed as u64;
            status.last_run = Some(Instant::now());
            status.total_runs
        };

        let _ = tx
            .send(CleanupEvent::PassCompleted {
                run_number,
                removed,
            })
            .await;
    }
}
