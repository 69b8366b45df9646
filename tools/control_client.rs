//! Control Client
//!
//! Publishes control commands to a running pipeline over NATS.
//!
//! Usage: control_client <nats_url> <subject> <command> [args]
//!   start [rate] | stop | clear | rate <tx/s> | probability <0-1>
//!   | enable <rule_id> | disable <rule_id> | toggle <rule_id>

use anyhow::{bail, Context, Result};
use tracing::info;
use transaction_sentinel::types::ControlCommand;

fn parse_command(args: &[String]) -> Result<ControlCommand> {
    let name = args.first().map(|s| s.as_str()).unwrap_or("");
    let value = args.get(1);

    let number = |what: &str| -> Result<f64> {
        value
            .with_context(|| format!("{} requires a value", what))?
            .parse::<f64>()
            .with_context(|| format!("{} must be a number", what))
    };
    let rule_id = || -> Result<String> {
        value
            .cloned()
            .with_context(|| format!("{} requires a rule id", name))
    };

    let command = match name {
        "start" => ControlCommand::Start {
            rate: match value {
                Some(_) => Some(number("start")?),
                None => None,
            },
        },
        "stop" => ControlCommand::Stop,
        "clear" => ControlCommand::Clear,
        "rate" => ControlCommand::SetRate {
            rate: number("rate")?,
        },
        "probability" => ControlCommand::SetFraudProbability {
            probability: number("probability")?,
        },
        "enable" => ControlCommand::SetRuleEnabled {
            rule_id: rule_id()?,
            enabled: true,
        },
        "disable" => ControlCommand::SetRuleEnabled {
            rule_id: rule_id()?,
            enabled: false,
        },
        "toggle" => ControlCommand::ToggleRule { rule_id: rule_id()? },
        other => bail!("unknown command {:?}", other),
    };
    Ok(command)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("control_client=info".parse()?),
        )
        .init();

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args.get(1).map(|s| s.as_str()).unwrap_or("nats://localhost:4222");
    let subject = args.get(2).map(|s| s.as_str()).unwrap_or("sentinel.control");
    let command = parse_command(args.get(3..).unwrap_or(&[]))?;

    let client = async_nats::connect(nats_url)
        .await
        .with_context(|| format!("Failed to connect to NATS at {}", nats_url))?;

    let payload = serde_json::to_vec(&command)?;
    client.publish(subject.to_string(), payload.into()).await?;
    client.flush().await?;

    info!(subject = %subject, command = ?command, "Control command published");
    Ok(())
}
