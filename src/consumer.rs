//! NATS consumer for control commands from the presentation side

use crate::scheduler::{IngestionScheduler, SchedulerError};
use crate::settings::SettingsError;
use crate::types::control::ControlCommand;
use anyhow::Result;
use async_nats::{Client, Subscriber};
use futures::StreamExt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Why a control command could not be applied
#[derive(Debug, Error)]
pub enum ControlError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Apply one command to the scheduler and its live settings
pub async fn apply_command(
    scheduler: &IngestionScheduler,
    command: ControlCommand,
) -> Result<(), ControlError> {
    let settings = scheduler.pipeline().settings();
    match command {
        ControlCommand::Start { rate } => {
            scheduler.start(rate.unwrap_or_else(|| scheduler.rate()))?;
        }
        ControlCommand::Stop => scheduler.stop().await,
        ControlCommand::Clear => scheduler.clear(),
        ControlCommand::SetRate { rate } => {
            scheduler.set_rate(rate)?;
        }
        ControlCommand::SetFraudProbability { probability } => {
            settings.set_fraud_probability(probability)?;
        }
        ControlCommand::SetRuleEnabled { rule_id, enabled } => {
            settings.set_rule_enabled(&rule_id, enabled)?;
        }
        ControlCommand::ToggleRule { rule_id } => {
            settings.toggle_rule(&rule_id)?;
        }
    }
    Ok(())
}

/// Consumer for receiving control commands from NATS
pub struct ControlConsumer {
    client: Client,
    subject: String,
}

impl ControlConsumer {
    /// Create a new control consumer
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Subscribe to the control subject
    pub async fn subscribe(&self) -> Result<Subscriber> {
        let subscriber = self.client.subscribe(self.subject.clone()).await?;
        info!(subject = %self.subject, "Subscribed to control subject");
        Ok(subscriber)
    }

    /// Apply commands until the subscription ends
    pub async fn run(self, scheduler: Arc<IngestionScheduler>) -> Result<()> {
        let mut subscription = self.subscribe().await?;

        while let Some(message) = subscription.next().await {
            let command = match serde_json::from_slice::<ControlCommand>(&message.payload) {
                Ok(command) => command,
                Err(e) => {
                    warn!(error = %e, "Failed to deserialize control command");
                    continue;
                }
            };

            info!(command = ?command, "Control command received");
            if let Err(e) = apply_command(&scheduler, command).await {
                warn!(error = %e, "Control command rejected");
            }
        }

        Ok(())
    }

    /// Get the subject name
    pub fn subject(&self) -> &str {
        &self.subject
    }
}
