//! Deterministic rule evaluation.
//!
//! Every enabled AMOUNT rule whose threshold is exceeded escalates the
//! transaction to SUSPICIOUS and lifts the risk score to at least the
//! escalation score. The escalation score is drawn once per evaluation, so
//! the result is a max-fold that does not depend on rule order or on how
//! many rules matched.

use crate::types::rule::{DetectionRule, RuleKind};
use crate::types::transaction::{Transaction, TransactionStatus};
use rand::Rng;
use std::ops::Range;

/// Risk score band assigned by a matching rule
pub const RULE_ESCALATION_RANGE: Range<u8> = 60..75;

/// Preliminary classification produced by the rule engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutcome {
    pub status: TransactionStatus,
    pub risk_score: u8,
    /// Ids of the rules that fired, sorted
    pub matched_rules: Vec<String>,
}

impl RuleOutcome {
    pub fn escalated(&self) -> bool {
        self.status != TransactionStatus::Legit
    }
}

/// Evaluates detection rules against single transactions
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleEngine;

impl RuleEngine {
    pub fn new() -> Self {
        Self
    }

    /// Whether a rule takes part in evaluation at all
    pub fn is_active(rule: &DetectionRule) -> bool {
        // FREQUENCY and LOCATION are placeholders in the catalogue
        rule.enabled && rule.kind == RuleKind::Amount
    }

    fn matches(rule: &DetectionRule, tx: &Transaction) -> bool {
        Self::is_active(rule) && tx.amount > rule.threshold
    }

    /// Evaluate `rules` against `tx`
    pub fn evaluate<R: Rng>(
        &self,
        tx: &Transaction,
        rules: &[DetectionRule],
        rng: &mut R,
    ) -> RuleOutcome {
        let mut matched_rules: Vec<String> = rules
            .iter()
            .filter(|rule| Self::matches(rule, tx))
            .map(|rule| rule.id.clone())
            .collect();
        matched_rules.sort();

        if matched_rules.is_empty() {
            return RuleOutcome {
                status: tx.status,
                risk_score: tx.risk_score,
                matched_rules,
            };
        }

        let escalation = rng.gen_range(RULE_ESCALATION_RANGE);
        let status = if tx.status.severity() > TransactionStatus::Suspicious.severity() {
            tx.status
        } else {
            TransactionStatus::Suspicious
        };

        RuleOutcome {
            status,
            risk_score: tx.risk_score.max(escalation),
            matched_rules,
        }
    }
}
