//! Escalation to the external classifier with a fixed fallback.
//!
//! A transaction is escalated when the rules marked it SUSPICIOUS or its
//! amount exceeds [`ESCALATION_AMOUNT`]. An escalated transaction gets
//! exactly one classifier call, bounded by a timeout. A valid answer
//! replaces the rule verdict; any failure applies the fallback verdict.

use crate::classifier::client::{ClassificationRequest, ClassifierError, RiskClassifier};
use crate::rules::RuleOutcome;
use crate::types::transaction::{Transaction, TransactionStatus};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Amount above which the classifier is consulted even without a rule match
pub const ESCALATION_AMOUNT: f64 = 12_000.0;
/// Risk score of the fallback verdict
pub const FALLBACK_RISK_SCORE: u8 = 65;
/// Reason attached to the fallback verdict
pub const FALLBACK_REASON: &str =
    "Latency spike detected. Classification defaulted to manual review.";
/// Default bound on a classifier call
pub const DEFAULT_CLASSIFIER_TIMEOUT: Duration = Duration::from_secs(3);

/// Where the final verdict of a transaction came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictSource {
    /// Not escalated; the rule engine's verdict stands
    Rules,
    /// The classifier answered
    Classifier,
    /// The classifier failed and the fallback verdict was applied
    Fallback,
}

/// A finalized transaction and the origin of its verdict
#[derive(Debug, Clone)]
pub struct Classification {
    pub transaction: Transaction,
    pub source: VerdictSource,
}

/// Decides whether to consult the classifier and merges the result
pub struct ClassifierOrchestrator {
    classifier: Arc<dyn RiskClassifier>,
    timeout: Duration,
}

impl ClassifierOrchestrator {
    pub fn new(classifier: Arc<dyn RiskClassifier>, timeout: Duration) -> Self {
        Self {
            classifier,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn classifier_name(&self) -> &str {
        self.classifier.name()
    }

    /// Whether `tx` with rule verdict `outcome` goes to the classifier
    pub fn needs_escalation(tx: &Transaction, outcome: &RuleOutcome) -> bool {
        outcome.status == TransactionStatus::Suspicious || tx.amount > ESCALATION_AMOUNT
    }

    /// Produce the finalized transaction
    pub async fn classify(&self, mut tx: Transaction, outcome: RuleOutcome) -> Classification {
        if !Self::needs_escalation(&tx, &outcome) {
            tx.status = outcome.status;
            tx.risk_score = outcome.risk_score;
            tx.reasoning = None;
            return Classification {
                transaction: tx,
                source: VerdictSource::Rules,
            };
        }

        let request = ClassificationRequest::from(&tx);
        let result = match tokio::time::timeout(self.timeout, self.classifier.classify(&request))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ClassifierError::Timeout(self.timeout)),
        };

        match result {
            Ok(verdict) => {
                let status = verdict.status.to_status();
                debug!(
                    transaction_id = %tx.id,
                    classifier = %self.classifier.name(),
                    external_status = ?verdict.status,
                    status = %status,
                    risk_score = verdict.risk_score,
                    "Classifier verdict applied"
                );
                tx.status = status;
                tx.risk_score = verdict.risk_score;
                tx.reasoning = Some(verdict.reason);
                Classification {
                    transaction: tx,
                    source: VerdictSource::Classifier,
                }
            }
            Err(e) => {
                warn!(
                    transaction_id = %tx.id,
                    classifier = %self.classifier.name(),
                    error = %e,
                    "Classifier unavailable, applying fallback verdict"
                );
                tx.status = TransactionStatus::Suspicious;
                tx.risk_score = FALLBACK_RISK_SCORE;
                tx.reasoning = Some(FALLBACK_REASON.to_string());
                Classification {
                    transaction: tx,
                    source: VerdictSource::Fallback,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::client::OfflineClassifier;
    use crate::classifier::testing::{HangingClassifier, ScriptedClassifier};
    use crate::types::transaction::Category;

    fn tx(amount: f64) -> Transaction {
        Transaction::new("TX-ORCH", amount, Category::Transfer, "Rio de Janeiro, BR")
            .with_accounts("ACC-123456", "ACC-654321")
            .with_risk_score(10)
    }

    fn legit(risk_score: u8) -> RuleOutcome {
        RuleOutcome {
            status: TransactionStatus::Legit,
            risk_score,
            matched_rules: Vec::new(),
        }
    }

    fn suspicious(risk_score: u8) -> RuleOutcome {
        RuleOutcome {
            status: TransactionStatus::Suspicious,
            risk_score,
            matched_rules: vec!["1".to_string()],
        }
    }

    fn orchestrator(classifier: Arc<dyn RiskClassifier>) -> ClassifierOrchestrator {
        ClassifierOrchestrator::new(classifier, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_not_escalated_passes_rule_verdict() {
        let classifier = Arc::new(ScriptedClassifier::fraud(90, "test"));
        let result = orchestrator(classifier.clone()).classify(tx(800.0), legit(10)).await;

        assert_eq!(result.source, VerdictSource::Rules);
        assert_eq!(result.transaction.status, TransactionStatus::Legit);
        assert_eq!(result.transaction.risk_score, 10);
        assert!(result.transaction.reasoning.is_none());
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_amount_gate_escalates_without_rules() {
        let classifier = Arc::new(ScriptedClassifier::fraud(90, "test"));
        let result = orchestrator(classifier.clone()).classify(tx(12_001.0), legit(10)).await;

        assert_eq!(result.source, VerdictSource::Classifier);
        assert_eq!(result.transaction.status, TransactionStatus::Fraud);
        assert_eq!(result.transaction.risk_score, 90);
        assert_eq!(result.transaction.reasoning.as_deref(), Some("test"));
        assert_eq!(classifier.calls(), 1);
    }

    #[tokio::test]
    async fn test_exact_gate_amount_is_not_escalated() {
        let classifier = Arc::new(ScriptedClassifier::fraud(90, "test"));
        orchestrator(classifier.clone()).classify(tx(12_000.0), legit(3)).await;
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_classifier_verdict_replaces_rule_verdict() {
        let classifier = Arc::new(ScriptedClassifier::new("LEGIT", 12.0, "known payee"));
        let result = orchestrator(classifier).classify(tx(6_000.0), suspicious(70)).await;

        assert_eq!(result.transaction.status, TransactionStatus::Legit);
        assert_eq!(result.transaction.risk_score, 12);
        assert_eq!(result.transaction.reasoning.as_deref(), Some("known payee"));
    }

    #[tokio::test]
    async fn test_unknown_status_is_treated_as_suspicious() {
        let classifier = Arc::new(ScriptedClassifier::new("ON_HOLD", 40.0, "odd"));
        let result = orchestrator(classifier).classify(tx(6_000.0), suspicious(70)).await;

        assert_eq!(result.source, VerdictSource::Classifier);
        assert_eq!(result.transaction.status, TransactionStatus::Suspicious);
        assert_eq!(result.transaction.risk_score, 40);
    }

    #[tokio::test]
    async fn test_lowercase_legit_does_not_clear_flagged_transaction() {
        let classifier = Arc::new(ScriptedClassifier::new("legit", 5.0, "r"));
        let result = orchestrator(classifier).classify(tx(30_000.0), suspicious(70)).await;

        assert_eq!(result.source, VerdictSource::Classifier);
        assert_eq!(result.transaction.status, TransactionStatus::Suspicious);
    }

    #[tokio::test]
    async fn test_failure_applies_fallback() {
        let result = orchestrator(Arc::new(OfflineClassifier))
            .classify(tx(30_000.0), suspicious(72))
            .await;

        assert_eq!(result.source, VerdictSource::Fallback);
        assert_eq!(result.transaction.status, TransactionStatus::Suspicious);
        assert_eq!(result.transaction.risk_score, FALLBACK_RISK_SCORE);
        assert_eq!(result.transaction.reasoning.as_deref(), Some(FALLBACK_REASON));
    }

    #[tokio::test]
    async fn test_malformed_score_applies_fallback() {
        let classifier = Arc::new(ScriptedClassifier::new("FRAUD", f64::NAN, "x"));
        let result = orchestrator(classifier).classify(tx(30_000.0), legit(5)).await;

        assert_eq!(result.source, VerdictSource::Fallback);
        assert_eq!(result.transaction.risk_score, 65);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_applies_fallback() {
        let orchestrator =
            ClassifierOrchestrator::new(Arc::new(HangingClassifier), Duration::from_millis(250));
        let result = orchestrator.classify(tx(20_000.0), suspicious(66)).await;

        assert_eq!(result.source, VerdictSource::Fallback);
        assert_eq!(result.transaction.status, TransactionStatus::Suspicious);
        assert_eq!(result.transaction.risk_score, FALLBACK_RISK_SCORE);
    }
}
