//! Type definitions for the detection pipeline

pub mod control;
pub mod rule;
pub mod stats;
pub mod transaction;

pub use control::ControlCommand;
pub use rule::{DetectionRule, RuleKind};
pub use stats::{ChartPoint, CycleReport, DashboardStats};
pub use transaction::{Category, Transaction, TransactionStatus};
