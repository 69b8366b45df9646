//! Transaction Sentinel
//!
//! Simulates a stream of payments, classifies each one with detection
//! rules and an external risk classifier, and keeps rolling statistics over
//! the most recent activity.

pub mod aggregator;
pub mod classifier;
pub mod config;
pub mod consumer;
pub mod generator;
pub mod metrics;
pub mod pipeline;
pub mod producer;
pub mod rules;
pub mod scheduler;
pub mod settings;
pub mod types;

pub use aggregator::RecentHistory;
pub use classifier::{ClassifierOrchestrator, HttpClassifier, OfflineClassifier, RiskClassifier};
pub use config::AppConfig;
pub use consumer::ControlConsumer;
pub use generator::TransactionGenerator;
pub use pipeline::Pipeline;
pub use producer::ReportProducer;
pub use rules::RuleEngine;
pub use scheduler::{IngestionScheduler, SchedulerState};
pub use settings::SharedSettings;
pub use types::{CycleReport, DashboardStats, DetectionRule, Transaction, TransactionStatus};
