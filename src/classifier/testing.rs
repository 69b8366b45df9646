//! Classifier doubles for tests

use crate::classifier::client::{
    ClassificationRequest, ClassifierError, ClassifierVerdict, RawVerdict, RiskClassifier,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Answers every request with the same payload, optionally after a delay
pub struct ScriptedClassifier {
    status: String,
    risk_score: f64,
    reason: String,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedClassifier {
    pub fn new(status: &str, risk_score: f64, reason: &str) -> Self {
        Self {
            status: status.to_string(),
            risk_score,
            reason: reason.to_string(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fraud(risk_score: u8, reason: &str) -> Self {
        Self::new("FRAUD", risk_score as f64, reason)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RiskClassifier for ScriptedClassifier {
    async fn classify(
        &self,
        _request: &ClassificationRequest,
    ) -> Result<ClassifierVerdict, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        RawVerdict {
            status: self.status.clone(),
            risk_score: self.risk_score,
            reason: self.reason.clone(),
        }
        .validate()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Never answers
pub struct HangingClassifier;

#[async_trait]
impl RiskClassifier for HangingClassifier {
    async fn classify(
        &self,
        _request: &ClassificationRequest,
    ) -> Result<ClassifierVerdict, ClassifierError> {
        std::future::pending().await
    }

    fn name(&self) -> &str {
        "hanging"
    }
}
