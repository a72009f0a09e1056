//! Health monitor
//!
//! Probes every model in the [`HealthTable`] on a fixed period and writes the
//! classified result back into the table. One cycle probes models one at a
//! time; cycles never overlap, whether triggered by the timer or by a direct
//! call to [`HealthMonitor::run_probe_cycle`].
//!
//! # Lifecycle
//!
//! ```text
//! HealthMonitor::start()
//!   ├── run_probe_cycle()            (awaited before start returns)
//!   └── spawned task
//!       └── every probe_interval: run_probe_cycle()
//! MonitorHandle::stop()              (signals the task and joins it)
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::health::{HealthStatus, HealthTable, ModelHealth};
use crate::probe::{Probe, ProbeOutcome};

/// Default latency threshold in milliseconds
pub const DEFAULT_LATENCY_THRESHOLD_MS: u64 = 1500;

/// Default period between probe cycles in milliseconds
pub const DEFAULT_PROBE_INTERVAL_MS: u64 = 10_000;

/// Default per-probe time budget in milliseconds
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 5_000;

/// Timing parameters for the monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    /// A successful probe at or above this latency is unhealthy
    pub latency_threshold_ms: u64,
    /// Period between cycle starts
    pub probe_interval_ms: u64,
    /// A probe still pending after this long counts as failed
    pub probe_timeout_ms: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            latency_threshold_ms: DEFAULT_LATENCY_THRESHOLD_MS,
            probe_interval_ms: DEFAULT_PROBE_INTERVAL_MS,
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
        }
    }
}

impl MonitorSettings {
    /// Period between cycles
    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    /// Per-probe time budget
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Classify a probe outcome against the latency threshold
///
/// Healthy only when the probe succeeded strictly under the threshold.
pub fn classify(outcome: &ProbeOutcome, latency_threshold_ms: u64) -> HealthStatus {
    if outcome.success && outcome.latency_ms < latency_threshold_ms {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    }
}

/// Background prober that keeps a [`HealthTable`] fresh
pub struct HealthMonitor {
    table: HealthTable,
    probe: Arc<dyn Probe>,
    settings: MonitorSettings,
    /// Serializes cycles.
    cycle_lock: Mutex<()>,
    cycles_completed: AtomicU64,
}

impl HealthMonitor {
    /// Create a monitor writing into `table`
    pub fn new(table: HealthTable, probe: Arc<dyn Probe>, settings: MonitorSettings) -> Self {
        Self {
            table,
            probe,
            settings,
            cycle_lock: Mutex::new(()),
            cycles_completed: AtomicU64::new(0),
        }
    }

    /// The table this monitor writes into
    pub fn table(&self) -> &HealthTable {
        &self.table
    }

    /// Timing parameters in effect
    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Number of cycles that ran to completion
    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed.load(Ordering::Acquire)
    }

    /// Probe every model once, sequentially
    ///
    /// A failing model never stops the cycle. If another cycle is in flight,
    /// this one waits for it to finish before starting.
    pub async fn run_probe_cycle(&self) {
        let _guard = self.cycle_lock.lock().await;
        let started = Instant::now();
        let mut healthy = 0usize;
        let mut unhealthy = 0usize;

        for model in self.table.models() {
            let health = self.probe_model(&model).await;
            let previous = self.table.get(&model).status;

            if previous != health.status {
                info!(
                    %model,
                    from = %previous,
                    to = %health.status,
                    latency_ms = ?health.latency_ms,
                    "model health changed"
                );
            }

            match health.status {
                HealthStatus::Healthy => healthy += 1,
                _ => unhealthy += 1,
            }
            self.table.record(&model, health);
        }

        let cycle = self.cycles_completed.fetch_add(1, Ordering::AcqRel) + 1;
        debug!(
            cycle,
            healthy,
            unhealthy,
            duration_ms = started.elapsed().as_millis() as u64,
            "probe cycle complete"
        );
    }

    /// Probe one model and turn the result into a table entry
    async fn probe_model(&self, model: &str) -> ModelHealth {
        let started = Instant::now();
        let threshold = self.settings.latency_threshold_ms;

        match tokio::time::timeout(self.settings.probe_timeout(), self.probe.probe(model)).await {
            Ok(Ok(outcome)) => {
                let status = classify(&outcome, threshold);
                if status == HealthStatus::Unhealthy {
                    warn!(
                        %model,
                        success = outcome.success,
                        latency_ms = outcome.latency_ms,
                        threshold_ms = threshold,
                        "probe classified unhealthy"
                    );
                }
                ModelHealth::probed(status, Some(outcome.latency_ms))
            }
            Ok(Err(e)) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                warn!(%model, error = %e, latency_ms, "probe failed");
                ModelHealth::probed(HealthStatus::Unhealthy, Some(latency_ms))
            }
            Err(_) => {
                warn!(
                    %model,
                    timeout_ms = self.settings.probe_timeout_ms,
                    "probe timed out"
                );
                ModelHealth::probed(HealthStatus::Unhealthy, Some(self.settings.probe_timeout_ms))
            }
        }
    }

    /// Run one cycle, then keep probing in the background
    ///
    /// The first cycle is awaited so the table holds real data before the
    /// caller starts serving. Dropping the returned handle stops the task.
    pub async fn start(self: Arc<Self>) -> MonitorHandle {
        self.run_probe_cycle().await;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let monitor = Arc::clone(&self);
        let handle = tokio::spawn(async move {
            monitor.run_loop(shutdown_rx).await;
        });

        info!(
            models = self.table.len(),
            interval_ms = self.settings.probe_interval_ms,
            threshold_ms = self.settings.latency_threshold_ms,
            "health monitor started"
        );

        MonitorHandle {
            shutdown_tx,
            handle,
        }
    }

    async fn run_loop(&self, mut shutdown: watch::Receiver<bool>) {
        let period = self.settings.probe_interval();
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => break,
            }
            tokio::select! {
                _ = self.run_probe_cycle() => {}
                _ = shutdown.changed() => break,
            }
        }

        debug!("health monitor loop shutting down");
    }
}

impl fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("models", &self.table.models())
            .field("settings", &self.settings)
            .field("cycles_completed", &self.cycles_completed())
            .finish()
    }
}

/// Handle to a running monitor task
#[derive(Debug)]
pub struct MonitorHandle {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl MonitorHandle {
    /// Whether the background task is still alive
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Signal shutdown and wait for the task to exit
    ///
    /// An in-flight cycle is abandoned; entries it already wrote stay.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            error!(error = %e, "health monitor task ended abnormally");
        }
        info!("health monitor stopped");
    }
}
