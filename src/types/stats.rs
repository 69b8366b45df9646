//! Aggregate dashboard statistics and per-cycle reports

use crate::types::transaction::Transaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rolling statistics over everything processed since the last clear
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Sum of all processed amounts
    pub total_volume: f64,
    /// FRAUD share of processed transactions, percent with two decimals
    pub fraud_rate: f64,
    /// Number of FRAUD transactions
    pub blocked_attempts: u64,
    /// Number of FRAUD or SUSPICIOUS transactions
    pub active_alerts: u64,
}

/// One point of the streaming chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub amount: f64,
    pub risk_score: u8,
}

impl From<&Transaction> for ChartPoint {
    fn from(tx: &Transaction) -> Self {
        Self {
            timestamp: tx.timestamp,
            amount: tx.amount,
            risk_score: tx.risk_score,
        }
    }
}

/// Everything the presentation side needs after a committed cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    /// Position of the cycle in start order
    pub sequence: u64,
    /// The newly finalized transaction
    pub transaction: Transaction,
    /// Statistics after this transaction was applied
    pub stats: DashboardStats,
    /// Recent history, most recent first. Empty when the cycle ran with
    /// nobody subscribed to reports.
    pub history: Vec<Transaction>,
}
