//! External risk classifier clients

use crate::types::transaction::{Category, Transaction, TransactionStatus, MAX_RISK_SCORE};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Reasons the external classifier could not produce a verdict
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("classifier did not answer within {0:?}")]
    Timeout(Duration),

    #[error("malformed classifier response: {0}")]
    Malformed(String),

    #[error("classifier unavailable: {0}")]
    Unavailable(String),
}

/// Read-only view of a transaction handed to the classifier
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRequest {
    pub id: String,
    pub amount: f64,
    pub category: Category,
    pub location: String,
    pub sender: String,
    pub receiver: String,
}

impl From<&Transaction> for ClassificationRequest {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: tx.id.clone(),
            amount: tx.amount,
            category: tx.category,
            location: tx.location.clone(),
            sender: tx.sender.clone(),
            receiver: tx.receiver.clone(),
        }
    }
}

/// Status text as reported by the classifier.
///
/// The classifier's status is free text. Only the exact values LEGIT,
/// SUSPICIOUS and FRAUD are recognised; anything else, including case or
/// whitespace variants, lands in `Unknown` and is treated as SUSPICIOUS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalStatus {
    Legit,
    Suspicious,
    Fraud,
    Unknown(String),
}

impl ExternalStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "LEGIT" => ExternalStatus::Legit,
            "SUSPICIOUS" => ExternalStatus::Suspicious,
            "FRAUD" => ExternalStatus::Fraud,
            _ => ExternalStatus::Unknown(raw.to_string()),
        }
    }

    pub fn to_status(&self) -> TransactionStatus {
        match self {
            ExternalStatus::Legit => TransactionStatus::Legit,
            ExternalStatus::Fraud => TransactionStatus::Fraud,
            ExternalStatus::Suspicious | ExternalStatus::Unknown(_) => {
                TransactionStatus::Suspicious
            }
        }
    }
}

/// Response body of the classifier service, before validation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVerdict {
    pub status: String,
    pub risk_score: f64,
    pub reason: String,
}

impl RawVerdict {
    /// Check the payload against the schema and map it onto local types
    pub fn validate(self) -> Result<ClassifierVerdict, ClassifierError> {
        if !self.risk_score.is_finite() {
            return Err(ClassifierError::Malformed(format!(
                "risk score {} is not a number",
                self.risk_score
            )));
        }
        let risk_score = self.risk_score.round().clamp(0.0, MAX_RISK_SCORE as f64) as u8;

        Ok(ClassifierVerdict {
            status: ExternalStatus::parse(&self.status),
            risk_score,
            reason: self.reason,
        })
    }
}

/// A validated classifier judgement
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierVerdict {
    pub status: ExternalStatus,
    pub risk_score: u8,
    pub reason: String,
}

/// An opaque service that judges escalated transactions
#[async_trait]
pub trait RiskClassifier: Send + Sync {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassifierVerdict, ClassifierError>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Classifier reached over HTTP with a JSON request/response pair
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpClassifier {
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ClassifierError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RiskClassifier for HttpClassifier {
    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<ClassifierVerdict, ClassifierError> {
        let mut builder = self.client.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?.error_for_status()?;
        let body = response.bytes().await?;
        let raw: RawVerdict = serde_json::from_slice(&body)
            .map_err(|e| ClassifierError::Malformed(e.to_string()))?;

        debug!(
            transaction_id = %request.id,
            status = %raw.status,
            risk_score = raw.risk_score,
            "Classifier responded"
        );

        raw.validate()
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Stand-in used when no classifier endpoint is configured
#[derive(Debug, Default)]
pub struct OfflineClassifier;

#[async_trait]
impl RiskClassifier for OfflineClassifier {
    async fn classify(
        &self,
        _request: &ClassificationRequest,
    ) -> Result<ClassifierVerdict, ClassifierError> {
        Err(ClassifierError::Unavailable(
            "no classifier endpoint configured".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "offline"
    }
}
