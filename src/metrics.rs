//! Performance metrics and statistics tracking for the detection pipeline.

use crate::classifier::VerdictSource;
use crate::types::transaction::TransactionStatus;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for pipeline cycles
pub struct PipelineMetrics {
    /// Cycles whose result reached the history buffer
    pub cycles_completed: AtomicU64,
    /// Cycles whose result was dropped after a stop or clear
    pub cycles_discarded: AtomicU64,
    /// Calls made to the external classifier
    pub classifier_calls: AtomicU64,
    /// Classifier calls that ended in the fallback verdict
    pub classifier_fallbacks: AtomicU64,
    /// Committed transactions by final status
    by_status: RwLock<HashMap<TransactionStatus, u64>>,
    /// Cycle durations (in microseconds)
    cycle_times: RwLock<Vec<u64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            cycles_completed: AtomicU64::new(0),
            cycles_discarded: AtomicU64::new(0),
            classifier_calls: AtomicU64::new(0),
            classifier_fallbacks: AtomicU64::new(0),
            by_status: RwLock::new(HashMap::new()),
            cycle_times: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record where a verdict came from
    pub fn record_verdict(&self, source: VerdictSource) {
        match source {
            VerdictSource::Rules => {}
            VerdictSource::Classifier => {
                self.classifier_calls.fetch_add(1, Ordering::Relaxed);
            }
            VerdictSource::Fallback => {
                self.classifier_calls.fetch_add(1, Ordering::Relaxed);
                self.classifier_fallbacks.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Record a cycle whose transaction was appended to the history
    pub fn record_committed(&self, status: TransactionStatus, cycle_time: Duration) {
        self.cycles_completed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_status) = self.by_status.write() {
            *by_status.entry(status).or_insert(0) += 1;
        }

        if let Ok(mut times) = self.cycle_times.write() {
            times.push(cycle_time.as_micros() as u64);
            // Keep only last 10000 for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }
    }

    /// Record a cycle dropped because its generation went stale
    pub fn record_discarded(&self) {
        self.cycles_discarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Get cycle time statistics
    pub fn get_cycle_stats(&self) -> CycleStats {
        let times = match self.cycle_times.read() {
            Ok(times) => times,
            Err(_) => return CycleStats::default(),
        };
        if times.is_empty() {
            return CycleStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort_unstable();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        CycleStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[((count as f64 * 0.95) as usize).min(count - 1)],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Committed transactions by final status
    pub fn get_status_counts(&self) -> HashMap<TransactionStatus, u64> {
        self.by_status
            .read()
            .map(|counts| counts.clone())
            .unwrap_or_default()
    }

    /// Committed cycles per second since start
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.cycles_completed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Share of classifier calls that fell back, in percent
    pub fn fallback_rate(&self) -> f64 {
        let calls = self.classifier_calls.load(Ordering::Relaxed);
        if calls == 0 {
            return 0.0;
        }
        self.classifier_fallbacks.load(Ordering::Relaxed) as f64 / calls as f64 * 100.0
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let completed = self.cycles_completed.load(Ordering::Relaxed);
        let discarded = self.cycles_discarded.load(Ordering::Relaxed);
        let calls = self.classifier_calls.load(Ordering::Relaxed);
        let fallbacks = self.classifier_fallbacks.load(Ordering::Relaxed);
        let cycle = self.get_cycle_stats();
        let counts = self.get_status_counts();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            TRANSACTION SENTINEL - METRICS SUMMARY            ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Cycles Completed: {:>8}  │  Throughput: {:>6.2} tx/s       ║",
            completed,
            self.get_throughput()
        );
        info!(
            "║ Cycles Discarded: {:>8}  │  Classifier Calls: {:>8}     ║",
            discarded, calls
        );
        info!(
            "║ Fallbacks:        {:>8}  │  Fallback Rate: {:>6.1}%        ║",
            fallbacks,
            self.fallback_rate()
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Cycle Time (μs): mean={:>7} p50={:>7} p95={:>7} max={:>7}",
            cycle.mean_us, cycle.p50_us, cycle.p95_us, cycle.max_us
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        for status in [
            TransactionStatus::Legit,
            TransactionStatus::Suspicious,
            TransactionStatus::Fraud,
        ] {
            let count = counts.get(&status).copied().unwrap_or(0);
            let pct = if completed > 0 {
                (count as f64 / completed as f64) * 100.0
            } else {
                0.0
            };
            info!("║   {:10}: {:>8} ({:>5.1}%)", status.as_str(), count, pct);
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Cycle time statistics
#[derive(Debug, Default)]
pub struct CycleStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub max_us: u64,
}

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs: interval_secs.max(1),
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let period = Duration::from_secs(self.interval_secs);
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}
