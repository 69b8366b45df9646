//! Transaction data structures for the simulated payment stream

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed set of places a simulated transaction can originate from
pub const LOCATIONS: [&str; 8] = [
    "New York, NY",
    "London, UK",
    "Tokyo, JP",
    "Berlin, DE",
    "San Francisco, CA",
    "Sydney, AU",
    "Cairo, EG",
    "Rio de Janeiro, BR",
];

/// Upper bound of the risk score scale
pub const MAX_RISK_SCORE: u8 = 100;

/// Classification outcome of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionStatus {
    #[default]
    Legit,
    Suspicious,
    Fraud,
}

impl TransactionStatus {
    /// Whether this status counts as an active alert
    pub fn is_alert(self) -> bool {
        matches!(self, TransactionStatus::Suspicious | TransactionStatus::Fraud)
    }

    /// Escalation rank, LEGIT lowest
    pub fn severity(self) -> u8 {
        match self {
            TransactionStatus::Legit => 0,
            TransactionStatus::Suspicious => 1,
            TransactionStatus::Fraud => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransactionStatus::Legit => "LEGIT",
            TransactionStatus::Suspicious => "SUSPICIOUS",
            TransactionStatus::Fraud => "FRAUD",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment channel of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Transfer,
    Atm,
    Pos,
    Online,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Transfer,
        Category::Atm,
        Category::Pos,
        Category::Online,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Transfer => "TRANSFER",
            Category::Atm => "ATM",
            Category::Pos => "POS",
            Category::Online => "ONLINE",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A simulated payment moving through the detection pipeline.
///
/// Everything except `status`, `risk_score` and `reasoning` is fixed at
/// generation time; those three are set during classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Unique transaction identifier
    pub id: String,

    /// Wall-clock creation instant, for display only. Ordering comes from
    /// the cycle sequence and the position in the recent history.
    pub timestamp: DateTime<Utc>,

    /// Transferred amount, never negative
    pub amount: f64,

    /// Sending account
    pub sender: String,

    /// Receiving account (may equal the sender)
    pub receiver: String,

    /// Payment channel
    pub category: Category,

    /// One of [`LOCATIONS`]
    pub location: String,

    /// Current classification
    pub status: TransactionStatus,

    /// Risk score (0 - 100)
    pub risk_score: u8,

    /// Explanation, only present when the external classifier was consulted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl Transaction {
    /// Create a LEGIT transaction with the given identity and amount
    pub fn new(id: impl Into<String>, amount: f64, category: Category, location: &str) -> Self {
        Self {
            id: id.into(),
            // not monotonic; never compared for ordering
            timestamp: Utc::now(),
            amount: amount.max(0.0),
            sender: String::new(),
            receiver: String::new(),
            category,
            location: location.to_string(),
            status: TransactionStatus::Legit,
            risk_score: 0,
            reasoning: None,
        }
    }

    /// Set the sending and receiving accounts
    pub fn with_accounts(mut self, sender: impl Into<String>, receiver: impl Into<String>) -> Self {
        self.sender = sender.into();
        self.receiver = receiver.into();
        self
    }

    /// Set the initial risk score
    pub fn with_risk_score(mut self, risk_score: u8) -> Self {
        self.risk_score = risk_score.min(MAX_RISK_SCORE);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_wire_format() {
        let tx = Transaction::new("TX-ABC", 1200.0, Category::Atm, "Tokyo, JP")
            .with_accounts("ACC-100001", "ACC-200002")
            .with_risk_score(12);

        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["category"], "ATM");
        assert_eq!(json["status"], "LEGIT");
        assert_eq!(json["riskScore"], 12);
        assert!(json.get("reasoning").is_none());

        let deserialized: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(tx, deserialized);
    }

    #[test]
    fn test_risk_score_is_capped() {
        let tx = Transaction::new("TX-1", 10.0, Category::Pos, "Cairo, EG").with_risk_score(250);
        assert_eq!(tx.risk_score, MAX_RISK_SCORE);
    }

    #[test]
    fn test_status_severity_order() {
        assert!(TransactionStatus::Legit.severity() < TransactionStatus::Suspicious.severity());
        assert!(TransactionStatus::Suspicious.severity() < TransactionStatus::Fraud.severity());
        assert!(!TransactionStatus::Legit.is_alert());
        assert!(TransactionStatus::Fraud.is_alert());
    }
}
