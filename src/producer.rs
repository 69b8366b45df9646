//! NATS message producer for cycle reports

use crate::types::stats::CycleReport;
use anyhow::Result;
use async_nats::Client;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error, info, warn};

/// Producer for publishing cycle reports to NATS
#[derive(Clone)]
pub struct ReportProducer {
    client: Client,
    subject: String,
}

impl ReportProducer {
    /// Create a new report producer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish a single cycle report
    pub async fn publish(&self, report: &CycleReport) -> Result<()> {
        let payload = serde_json::to_vec(report)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            sequence = report.sequence,
            transaction_id = %report.transaction.id,
            status = %report.transaction.status,
            "Published cycle report"
        );

        Ok(())
    }

    /// Forward every report from `reports` until the channel closes
    pub async fn run(self, mut reports: broadcast::Receiver<CycleReport>) {
        info!(subject = %self.subject, "Forwarding cycle reports");
        loop {
            match reports.recv().await {
                Ok(report) => {
                    if let Err(e) = self.publish(&report).await {
                        error!(
                            sequence = report.sequence,
                            error = %e,
                            "Failed to publish cycle report"
                        );
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Report forwarder fell behind, reports dropped");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}
