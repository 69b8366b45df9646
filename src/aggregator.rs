//! Recent-history buffer and rolling dashboard statistics.
//!
//! The buffer holds the last [`HISTORY_CAPACITY`] finalized transactions,
//! most recent first, evicting the oldest on overflow. Totals accumulate
//! until [`RecentHistory::clear`]; the fraud rate is recomputed from the
//! counts on every append.

use crate::types::stats::{ChartPoint, DashboardStats};
use crate::types::transaction::{Transaction, TransactionStatus};
use std::collections::VecDeque;

/// Number of transactions kept in the recent-history buffer
pub const HISTORY_CAPACITY: usize = 100;
/// Number of transactions shown in the streaming chart
pub const CHART_WINDOW: usize = 20;

/// Round to two decimal places
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Bounded recent history plus the statistics derived from it
#[derive(Debug, Clone)]
pub struct RecentHistory {
    buffer: VecDeque<Transaction>,
    stats: DashboardStats,
    total_processed: u64,
}

impl RecentHistory {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(HISTORY_CAPACITY + 1),
            stats: DashboardStats::default(),
            total_processed: 0,
        }
    }

    /// Record a finalized transaction
    pub fn append(&mut self, tx: Transaction) {
        self.total_processed += 1;
        self.stats.total_volume += tx.amount;
        if tx.status == TransactionStatus::Fraud {
            self.stats.blocked_attempts += 1;
        }
        if tx.status.is_alert() {
            self.stats.active_alerts += 1;
        }
        self.stats.fraud_rate = round2(
            self.stats.blocked_attempts as f64 / self.total_processed as f64 * 100.0,
        );

        self.buffer.push_front(tx);
        self.buffer.truncate(HISTORY_CAPACITY);
    }

    /// Drop every transaction and zero the statistics
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.stats = DashboardStats::default();
        self.total_processed = 0;
    }

    pub fn stats(&self) -> &DashboardStats {
        &self.stats
    }

    /// Transactions processed since the last clear, including evicted ones
    pub fn total_processed(&self) -> u64 {
        self.total_processed
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Buffered transactions, most recent first
    pub fn recent(&self) -> impl Iterator<Item = &Transaction> {
        self.buffer.iter()
    }

    /// Owned copy of the buffer, most recent first
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.buffer.iter().cloned().collect()
    }

    /// The last [`CHART_WINDOW`] transactions, oldest append first
    pub fn chart_window(&self) -> Vec<ChartPoint> {
        self.buffer
            .iter()
            .take(CHART_WINDOW)
            .rev()
            .map(ChartPoint::from)
            .collect()
    }

    /// Transactions whose id or sender contains `term`, ignoring case
    pub fn search(&self, term: &str) -> Vec<&Transaction> {
        let term = term.to_lowercase();
        self.buffer
            .iter()
            .filter(|tx| {
                tx.id.to_lowercase().contains(&term) || tx.sender.to_lowercase().contains(&term)
            })
            .collect()
    }
}

impl Default for RecentHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::transaction::Category;
    use chrono::{Duration, Utc};

    fn finalized(n: usize, amount: f64, status: TransactionStatus) -> Transaction {
        let mut tx = Transaction::new(format!("TX-{n:04}"), amount, Category::Online, "Sydney, AU")
            .with_accounts(format!("ACC-{}", 100_000 + n), "ACC-999999");
        tx.status = status;
        tx
    }

    #[test]
    fn test_buffer_is_bounded_and_most_recent_first() {
        let mut history = RecentHistory::new();
        for n in 0..150 {
            history.append(finalized(n, 1.0, TransactionStatus::Legit));
            assert_eq!(history.len(), (n + 1).min(HISTORY_CAPACITY));
        }

        let ids: Vec<&str> = history.recent().map(|tx| tx.id.as_str()).collect();
        assert_eq!(ids.first(), Some(&"TX-0149"));
        assert_eq!(ids.last(), Some(&"TX-0050"));
        assert_eq!(history.total_processed(), 150);
        assert_eq!(history.stats().total_volume, 150.0);
    }

    #[test]
    fn test_fraud_rate_uses_all_processed() {
        let mut history = RecentHistory::new();
        // 1 FRAUD out of 3 => 33.33
        history.append(finalized(0, 10.0, TransactionStatus::Fraud));
        history.append(finalized(1, 10.0, TransactionStatus::Legit));
        history.append(finalized(2, 10.0, TransactionStatus::Suspicious));

        let stats = history.stats();
        assert_eq!(stats.blocked_attempts, 1);
        assert_eq!(stats.active_alerts, 2);
        assert_eq!(stats.fraud_rate, 33.33);

        // keeps counting past the buffer capacity: 1 out of 201
        for n in 3..201 {
            history.append(finalized(n, 0.0, TransactionStatus::Legit));
        }
        assert_eq!(history.stats().fraud_rate, round2(1.0 / 201.0 * 100.0));
        assert_eq!(history.stats().fraud_rate, 0.5);
    }

    #[test]
    fn test_fraud_rate_two_thirds() {
        let mut history = RecentHistory::new();
        history.append(finalized(0, 1.0, TransactionStatus::Fraud));
        history.append(finalized(1, 1.0, TransactionStatus::Fraud));
        history.append(finalized(2, 1.0, TransactionStatus::Legit));
        assert_eq!(history.stats().fraud_rate, 66.67);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut history = RecentHistory::new();
        history.append(finalized(0, 12_000.0, TransactionStatus::Fraud));
        history.clear();

        assert!(history.is_empty());
        assert_eq!(history.total_processed(), 0);
        assert_eq!(history.stats(), &DashboardStats::default());

        history.append(finalized(1, 5.0, TransactionStatus::Legit));
        assert_eq!(history.stats().fraud_rate, 0.0);
        assert_eq!(history.stats().total_volume, 5.0);
    }

    #[test]
    fn test_chart_window_is_chronological() {
        let mut history = RecentHistory::new();
        for n in 0..30 {
            history.append(finalized(n, n as f64, TransactionStatus::Legit));
        }

        let chart = history.chart_window();
        assert_eq!(chart.len(), CHART_WINDOW);
        assert_eq!(chart.first().map(|p| p.amount), Some(10.0));
        assert_eq!(chart.last().map(|p| p.amount), Some(29.0));
    }

    #[test]
    fn test_order_follows_appends_not_timestamps() {
        let mut history = RecentHistory::new();
        let base = Utc::now();
        for n in 0..5 {
            let mut tx = finalized(n, n as f64, TransactionStatus::Legit);
            // clock stepped backwards between appends
            tx.timestamp = base - Duration::seconds(n as i64);
            history.append(tx);
        }

        let ids: Vec<&str> = history.recent().map(|tx| tx.id.as_str()).collect();
        assert_eq!(ids, ["TX-0004", "TX-0003", "TX-0002", "TX-0001", "TX-0000"]);

        let amounts: Vec<f64> = history.chart_window().iter().map(|p| p.amount).collect();
        assert_eq!(amounts, [0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_search_matches_id_or_sender() {
        let mut history = RecentHistory::new();
        for n in 0..5 {
            history.append(finalized(n, 1.0, TransactionStatus::Legit));
        }

        assert_eq!(history.search("tx-0003").len(), 1);
        assert_eq!(history.search("acc-100004").len(), 1);
        assert_eq!(history.search("ACC-9").len(), 0);
        assert_eq!(history.search("").len(), 5);
    }
}
