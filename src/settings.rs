//! Live simulation settings shared between the control side and the pipeline.
//!
//! Knob values are validated here, before they can reach the scheduler.
//! Each cycle takes one [`SettingsSnapshot`] at its start, so a change only
//! affects cycles that begin after it.

use crate::types::rule::DetectionRule;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::info;

/// Slowest accepted ingestion rate (transactions per second)
pub const MIN_RATE_PER_SECOND: f64 = 0.1;
/// Fastest accepted ingestion rate (transactions per second)
pub const MAX_RATE_PER_SECOND: f64 = 50.0;

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("fraud probability must be a finite number, got {0}")]
    InvalidProbability(f64),

    #[error("ingestion rate must be a positive finite number, got {0}")]
    InvalidRate(f64),

    #[error("no detection rule with id {0:?}")]
    UnknownRule(String),
}

/// Validate a fraud-injection probability, clamping it into [0, 1]
pub fn validate_probability(probability: f64) -> Result<f64, SettingsError> {
    if !probability.is_finite() {
        return Err(SettingsError::InvalidProbability(probability));
    }
    Ok(probability.clamp(0.0, 1.0))
}

/// Validate an ingestion rate, clamping it into the supported band
pub fn validate_rate(rate: f64) -> Result<f64, SettingsError> {
    if !rate.is_finite() || rate <= 0.0 {
        return Err(SettingsError::InvalidRate(rate));
    }
    Ok(rate.clamp(MIN_RATE_PER_SECOND, MAX_RATE_PER_SECOND))
}

/// Values read by a single cycle
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsSnapshot {
    pub fraud_probability: f64,
    pub rules: Vec<DetectionRule>,
}

#[derive(Debug)]
struct SettingsInner {
    fraud_probability: f64,
    rules: Vec<DetectionRule>,
}

/// Cloneable handle to the live settings
#[derive(Debug, Clone)]
pub struct SharedSettings {
    inner: Arc<RwLock<SettingsInner>>,
}

impl SharedSettings {
    pub fn new(fraud_probability: f64, rules: Vec<DetectionRule>) -> Result<Self, SettingsError> {
        Ok(Self {
            inner: Arc::new(RwLock::new(SettingsInner {
                fraud_probability: validate_probability(fraud_probability)?,
                rules,
            })),
        })
    }

    // A poisoned lock only means a writer panicked between two plain field
    // assignments; the data is still usable.
    fn read(&self) -> RwLockReadGuard<'_, SettingsInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, SettingsInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Copy of the current values
    pub fn snapshot(&self) -> SettingsSnapshot {
        let inner = self.read();
        SettingsSnapshot {
            fraud_probability: inner.fraud_probability,
            rules: inner.rules.clone(),
        }
    }

    pub fn fraud_probability(&self) -> f64 {
        self.read().fraud_probability
    }

    /// Set the fraud probability; returns the value actually stored
    pub fn set_fraud_probability(&self, probability: f64) -> Result<f64, SettingsError> {
        let probability = validate_probability(probability)?;
        self.write().fraud_probability = probability;
        info!(fraud_probability = probability, "Fraud probability updated");
        Ok(probability)
    }

    pub fn rules(&self) -> Vec<DetectionRule> {
        self.read().rules.clone()
    }

    pub fn set_rule_enabled(&self, rule_id: &str, enabled: bool) -> Result<(), SettingsError> {
        let mut inner = self.write();
        let rule = inner
            .rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| SettingsError::UnknownRule(rule_id.to_string()))?;
        rule.enabled = enabled;
        info!(rule_id = %rule_id, rule = %rule.name, enabled, "Detection rule updated");
        Ok(())
    }

    /// Flip a rule's enabled flag; returns the new value
    pub fn toggle_rule(&self, rule_id: &str) -> Result<bool, SettingsError> {
        let enabled = {
            let inner = self.read();
            let rule = inner
                .rules
                .iter()
                .find(|r| r.id == rule_id)
                .ok_or_else(|| SettingsError::UnknownRule(rule_id.to_string()))?;
            !rule.enabled
        };
        self.set_rule_enabled(rule_id, enabled)?;
        Ok(enabled)
    }
}
