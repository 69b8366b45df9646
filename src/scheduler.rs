//! Rate-adjustable, cancellable ingestion scheduler.
//!
//! A single tokio task owns the timer and runs every cycle inline, so at
//! most one cycle is in flight and history order matches start order. Ticks
//! that fall due while a cycle is still running are skipped. The rate lives
//! in a watch channel; a change rebuilds the timer inside the same task.

use crate::pipeline::Pipeline;
use crate::settings::{validate_rate, SettingsError};
use crate::types::stats::CycleReport;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{error, info};

/// Capacity of the report broadcast channel
const REPORT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
}

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("scheduler is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

struct RunningLoop {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

/// Drives the pipeline on a periodic cadence
pub struct IngestionScheduler {
    pipeline: Arc<Pipeline>,
    rate: watch::Sender<f64>,
    reports: broadcast::Sender<CycleReport>,
    running: Mutex<Option<RunningLoop>>,
}

impl IngestionScheduler {
    pub fn new(pipeline: Arc<Pipeline>, rate_per_second: f64) -> Result<Self, SettingsError> {
        let (rate, _) = watch::channel(validate_rate(rate_per_second)?);
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);

        Ok(Self {
            pipeline,
            rate,
            reports,
            running: Mutex::new(None),
        })
    }

    fn lock_running(&self) -> MutexGuard<'_, Option<RunningLoop>> {
        self.running.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Current rate in transactions per second
    pub fn rate(&self) -> f64 {
        *self.rate.borrow()
    }

    pub fn state(&self) -> SchedulerState {
        match self.lock_running().as_ref() {
            Some(running) if !running.handle.is_finished() => SchedulerState::Running,
            _ => SchedulerState::Stopped,
        }
    }

    /// Receive a report for every committed cycle
    pub fn subscribe(&self) -> broadcast::Receiver<CycleReport> {
        self.reports.subscribe()
    }

    /// Start firing cycles at `rate_per_second`. Must be called from
    /// within a tokio runtime.
    pub fn start(&self, rate_per_second: f64) -> Result<(), SchedulerError> {
        let rate = validate_rate(rate_per_second)?;

        let mut running = self.lock_running();
        if let Some(existing) = running.as_ref() {
            if !existing.handle.is_finished() {
                return Err(SchedulerError::AlreadyRunning);
            }
        }

        self.rate.send_replace(rate);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run_loop(
            self.pipeline.clone(),
            self.rate.subscribe(),
            shutdown_rx,
            self.reports.clone(),
        ));
        *running = Some(RunningLoop {
            shutdown: shutdown_tx,
            handle,
        });

        info!(
            rate_per_second = rate,
            generation = self.pipeline.generation(),
            "Ingestion started"
        );
        Ok(())
    }

    /// Stop ingesting. A cycle in flight is cancelled and its result is
    /// never applied. Returns once the timer task has exited.
    pub async fn stop(&self) {
        let running = self.lock_running().take();
        let Some(running) = running else {
            return;
        };

        let generation = self.pipeline.invalidate();
        // The loop may already have exited, in which case nobody listens
        let _ = running.shutdown.send(());
        if let Err(e) = running.handle.await {
            if e.is_panic() {
                error!(error = %e, "Ingestion loop panicked");
            }
        }

        info!(generation, "Ingestion stopped");
    }

    /// Change the rate; takes effect immediately when running, otherwise on
    /// the next start. Returns the rate actually applied.
    pub fn set_rate(&self, rate_per_second: f64) -> Result<f64, SettingsError> {
        let rate = validate_rate(rate_per_second)?;
        self.rate.send_replace(rate);
        info!(rate_per_second = rate, "Ingestion rate updated");
        Ok(rate)
    }

    /// Drop history and statistics; settings and run state are unchanged
    pub fn clear(&self) {
        self.pipeline.clear();
    }
}

fn build_ticker(rate_per_second: f64) -> Interval {
    let period = Duration::from_secs_f64(1.0 / rate_per_second);
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

async fn run_loop(
    pipeline: Arc<Pipeline>,
    mut rate: watch::Receiver<f64>,
    mut shutdown: oneshot::Receiver<()>,
    reports: broadcast::Sender<CycleReport>,
) {
    let mut ticker = build_ticker(*rate.borrow_and_update());

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            changed = rate.changed() => {
                if changed.is_err() {
                    break;
                }
                let rate_per_second = *rate.borrow_and_update();
                ticker = build_ticker(rate_per_second);
            }
            _ = ticker.tick() => {
                tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    report = pipeline.run_cycle_with(reports.receiver_count() > 0) => {
                        if let Some(report) = report {
                            // No subscribers is fine
                            let _ = reports.send(report);
                        }
                    }
                }
            }
        }
    }
}
