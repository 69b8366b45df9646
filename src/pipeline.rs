//! One generation, rules, classification and aggregation pass.
//!
//! The pipeline owns the recent history. A cycle reads a settings snapshot
//! and the current generation when it starts, and its result is applied
//! only if the generation is unchanged at commit time. `clear` and
//! `invalidate` bump the generation while holding the history lock, so a
//! result that arrives after them can never reach the buffer.

use crate::aggregator::RecentHistory;
use crate::classifier::ClassifierOrchestrator;
use crate::generator::TransactionGenerator;
use crate::metrics::PipelineMetrics;
use crate::rules::RuleEngine;
use crate::settings::SharedSettings;
use crate::types::stats::{ChartPoint, CycleReport, DashboardStats};
use crate::types::transaction::Transaction;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Instant;
use tracing::{debug, info};

pub struct Pipeline {
    settings: SharedSettings,
    rule_engine: RuleEngine,
    orchestrator: ClassifierOrchestrator,
    history: RwLock<RecentHistory>,
    rng: Mutex<StdRng>,
    generation: AtomicU64,
    next_sequence: AtomicU64,
    metrics: Arc<PipelineMetrics>,
}

impl Pipeline {
    /// Build a pipeline; a `seed` makes the generated stream reproducible
    pub fn new(
        settings: SharedSettings,
        orchestrator: ClassifierOrchestrator,
        metrics: Arc<PipelineMetrics>,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            settings,
            rule_engine: RuleEngine::new(),
            orchestrator,
            history: RwLock::new(RecentHistory::new()),
            rng: Mutex::new(rng),
            generation: AtomicU64::new(0),
            next_sequence: AtomicU64::new(0),
            metrics,
        }
    }

    pub fn settings(&self) -> &SharedSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    pub fn orchestrator(&self) -> &ClassifierOrchestrator {
        &self.orchestrator
    }

    // History mutations are single appends or a full clear, so a poisoned
    // lock still guards consistent data.
    fn read_history(&self) -> RwLockReadGuard<'_, RecentHistory> {
        self.history.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_history(&self) -> RwLockWriteGuard<'_, RecentHistory> {
        self.history.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Current generation tag
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Make every cycle started so far stale; returns the new generation
    pub fn invalidate(&self) -> u64 {
        let _history = self.write_history();
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Drop the recent history and zero the statistics.
    ///
    /// Settings are untouched and a cycle in flight is discarded when it
    /// completes.
    pub fn clear(&self) {
        let mut history = self.write_history();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let dropped = history.len();
        history.clear();
        info!(generation, dropped, "History and statistics cleared");
    }

    pub fn stats(&self) -> DashboardStats {
        self.read_history().stats().clone()
    }

    pub fn total_processed(&self) -> u64 {
        self.read_history().total_processed()
    }

    /// Recent history, most recent first
    pub fn history(&self) -> Vec<Transaction> {
        self.read_history().snapshot()
    }

    pub fn chart_window(&self) -> Vec<ChartPoint> {
        self.read_history().chart_window()
    }

    pub fn search(&self, term: &str) -> Vec<Transaction> {
        self.read_history()
            .search(term)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Run one cycle. Returns `None` when the result went stale.
    pub async fn run_cycle(&self) -> Option<CycleReport> {
        self.run_cycle_with(true).await
    }

    /// Run one cycle, copying the recent history into the report only when
    /// `include_history` is set.
    pub async fn run_cycle_with(&self, include_history: bool) -> Option<CycleReport> {
        let started = Instant::now();
        let generation = self.generation();
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let snapshot = self.settings.snapshot();

        let (tx, outcome) = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            let tx = TransactionGenerator::generate(&mut *rng, snapshot.fraud_probability);
            let outcome = self.rule_engine.evaluate(&tx, &snapshot.rules, &mut *rng);
            (tx, outcome)
        };

        if outcome.escalated() {
            debug!(
                sequence,
                transaction_id = %tx.id,
                amount = tx.amount,
                matched_rules = ?outcome.matched_rules,
                "Detection rules matched"
            );
        }

        let classification = self.orchestrator.classify(tx, outcome).await;
        self.metrics.record_verdict(classification.source);

        self.commit(
            generation,
            sequence,
            classification.transaction,
            started,
            include_history,
        )
    }

    fn commit(
        &self,
        generation: u64,
        sequence: u64,
        tx: Transaction,
        started: Instant,
        include_history: bool,
    ) -> Option<CycleReport> {
        let mut history = self.write_history();
        let current = self.generation();
        if current != generation {
            drop(history);
            self.metrics.record_discarded();
            debug!(
                sequence,
                transaction_id = %tx.id,
                cycle_generation = generation,
                current_generation = current,
                "Discarding result of stale cycle"
            );
            return None;
        }

        history.append(tx.clone());
        let stats = history.stats().clone();
        let snapshot = if include_history {
            history.snapshot()
        } else {
            Vec::new()
        };
        drop(history);

        let elapsed = started.elapsed();
        self.metrics.record_committed(tx.status, elapsed);

        if tx.status.is_alert() {
            info!(
                sequence,
                transaction_id = %tx.id,
                amount = tx.amount,
                status = %tx.status,
                risk_score = tx.risk_score,
                cycle_time_us = elapsed.as_micros(),
                "Transaction flagged"
            );
        } else {
            debug!(
                sequence,
                transaction_id = %tx.id,
                amount = tx.amount,
                risk_score = tx.risk_score,
                cycle_time_us = elapsed.as_micros(),
                "Transaction processed"
            );
        }

        Some(CycleReport {
            sequence,
            transaction: tx,
            stats,
            history: snapshot,
        })
    }
}
