//! External risk classification

pub mod client;
pub mod orchestrator;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{
    ClassificationRequest, ClassifierError, ClassifierVerdict, ExternalStatus, HttpClassifier,
    OfflineClassifier, RiskClassifier,
};
pub use orchestrator::{Classification, ClassifierOrchestrator, VerdictSource};
