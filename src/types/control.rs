//! Control messages sent by the presentation side

use serde::{Deserialize, Serialize};

/// A command that drives the scheduler or edits live settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ControlCommand {
    /// Start ingesting; uses the current rate when none is given
    Start {
        #[serde(default)]
        rate: Option<f64>,
    },
    Stop,
    /// Drop history and zero the statistics
    Clear,
    SetRate {
        rate: f64,
    },
    SetFraudProbability {
        probability: f64,
    },
    SetRuleEnabled {
        rule_id: String,
        enabled: bool,
    },
    ToggleRule {
        rule_id: String,
    },
}
