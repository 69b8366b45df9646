//! Configuration management for the transaction sentinel

use crate::classifier::orchestrator::DEFAULT_CLASSIFIER_TIMEOUT;
use crate::settings::{validate_probability, validate_rate, SharedSettings};
use crate::types::rule::DetectionRule;
use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Environment variable that overrides the configuration file path
pub const CONFIG_PATH_ENV: &str = "SENTINEL_CONFIG";
/// Configuration file used when no override is set
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub nats: NatsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Initial detection rule catalogue
    #[serde(default = "DetectionRule::default_catalogue")]
    pub rules: Vec<DetectionRule>,
}

/// Simulation knobs at startup
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Probability that a generated transaction is drawn from the high band
    #[serde(default = "default_fraud_probability")]
    pub fraud_probability: f64,
    /// Transactions generated per second
    #[serde(default = "default_rate_per_second")]
    pub rate_per_second: f64,
    /// Start ingesting as soon as the pipeline is up
    #[serde(default = "default_autostart")]
    pub autostart: bool,
    /// Fixed seed for a reproducible stream
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_fraud_probability() -> f64 {
    0.15
}

fn default_rate_per_second() -> f64 {
    2.0
}

fn default_autostart() -> bool {
    true
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fraud_probability: default_fraud_probability(),
            rate_per_second: default_rate_per_second(),
            autostart: default_autostart(),
            seed: None,
        }
    }
}

/// External classifier configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// HTTP endpoint; without one every escalation takes the fallback verdict
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the bearer key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Bound on a single classifier call in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_api_key_env() -> String {
    "CLASSIFIER_API_KEY".to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_CLASSIFIER_TIMEOUT.as_millis() as u64
}

impl ClassifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Bearer key from the configured environment variable, if set
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key_env: default_api_key_env(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// NATS connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NatsConfig {
    /// Publish reports and accept control commands over NATS
    #[serde(default)]
    pub enabled: bool,
    /// NATS server URL
    #[serde(default = "default_nats_url")]
    pub url: String,
    /// Subject for outgoing cycle reports
    #[serde(default = "default_report_subject")]
    pub report_subject: String,
    /// Subject for incoming control commands
    #[serde(default = "default_control_subject")]
    pub control_subject: String,
}

fn default_nats_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_report_subject() -> String {
    "sentinel.reports".to_string()
}

fn default_control_subject() -> String {
    "sentinel.control".to_string()
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_nats_url(),
            report_subject: default_report_subject(),
            control_subject: default_control_subject(),
        }
    }
}

/// Metrics reporting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    /// Seconds between periodic summaries
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,
}

fn default_report_interval() -> u64 {
    30
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            report_interval_secs: default_report_interval(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `SENTINEL_CONFIG` or the default path
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Load configuration from a specific path.
    ///
    /// `SENTINEL__SECTION__KEY` environment variables override file values.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("SENTINEL").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        Self::finish(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .context("Failed to build configuration")?;

        Self::finish(config)
    }

    fn finish(config: Config) -> Result<Self> {
        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        validate_probability(self.simulation.fraud_probability)
            .context("Invalid simulation.fraud_probability")?;
        validate_rate(self.simulation.rate_per_second)
            .context("Invalid simulation.rate_per_second")?;
        if self.classifier.timeout_ms == 0 {
            anyhow::bail!("classifier.timeout_ms must be greater than zero");
        }

        let mut ids: Vec<&str> = self.rules.iter().map(|r| r.id.as_str()).collect();
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|pair| pair[0] == pair[1]) {
            anyhow::bail!("duplicate detection rule id {:?}", pair[0]);
        }
        Ok(())
    }

    /// Live settings seeded from this configuration
    pub fn shared_settings(&self) -> Result<SharedSettings> {
        SharedSettings::new(self.simulation.fraud_probability, self.rules.clone())
            .context("Invalid simulation settings")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            classifier: ClassifierConfig::default(),
            nats: NatsConfig::default(),
            metrics: MetricsConfig::default(),
            logging: LoggingConfig::default(),
            rules: DetectionRule::default_catalogue(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::rule::RuleKind;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.simulation.fraud_probability, 0.15);
        assert_eq!(config.simulation.rate_per_second, 2.0);
        assert_eq!(config.classifier.timeout(), Duration::from_secs(3));
        assert!(config.classifier.endpoint.is_none());
        assert!(!config.nats.enabled);
        assert_eq!(config.rules.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [simulation]
            rate_per_second = 5.0

            [[rules]]
            id = "big"
            name = "Big"
            kind = "AMOUNT"
            threshold = 20000.0
            "#,
        )
        .unwrap();

        assert_eq!(config.simulation.rate_per_second, 5.0);
        assert_eq!(config.simulation.fraud_probability, 0.15);
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].kind, RuleKind::Amount);
        assert!(config.rules[0].enabled);
        assert_eq!(config.nats.report_subject, "sentinel.reports");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(AppConfig::from_toml_str("[simulation]\nrate_per_second = 0.0\n").is_err());
        assert!(AppConfig::from_toml_str("[classifier]\ntimeout_ms = 0\n").is_err());
        assert!(AppConfig::from_toml_str(
            r#"
            [[rules]]
            id = "1"
            name = "a"
            kind = "AMOUNT"
            threshold = 1.0

            [[rules]]
            id = "1"
            name = "b"
            kind = "AMOUNT"
            threshold = 2.0
            "#
        )
        .is_err());
    }

    #[test]
    fn test_out_of_range_probability_is_clamped_in_settings() {
        let config =
            AppConfig::from_toml_str("[simulation]\nfraud_probability = 1.5\n").unwrap();
        let settings = config.shared_settings().unwrap();
        assert_eq!(settings.fraud_probability(), 1.0);
    }
}
