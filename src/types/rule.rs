//! Detection rule configuration entities

use serde::{Deserialize, Serialize};

/// Kind of signal a rule inspects.
///
/// Only `Amount` is evaluated; the other kinds are carried in the catalogue
/// but never match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleKind {
    Amount,
    Frequency,
    Location,
}

/// A toggleable detection rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRule {
    pub id: String,
    pub name: String,
    pub kind: RuleKind,
    pub threshold: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl DetectionRule {
    pub fn new(id: &str, name: &str, kind: RuleKind, threshold: f64, enabled: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            threshold,
            enabled,
        }
    }

    /// The catalogue the simulator ships with
    pub fn default_catalogue() -> Vec<DetectionRule> {
        vec![
            DetectionRule::new("1", "Large Value Monitoring", RuleKind::Amount, 10_000.0, true),
            DetectionRule::new("2", "Cross-Border Threshold", RuleKind::Amount, 5_000.0, true),
            DetectionRule::new("3", "High Frequency POS", RuleKind::Frequency, 10.0, false),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_deserialization_defaults_enabled() {
        let rule: DetectionRule = serde_json::from_str(
            r#"{"id":"9","name":"Geo","kind":"LOCATION","threshold":1.0}"#,
        )
        .unwrap();
        assert_eq!(rule.kind, RuleKind::Location);
        assert!(rule.enabled);
    }

    #[test]
    fn test_default_catalogue() {
        let rules = DetectionRule::default_catalogue();
        assert_eq!(rules.len(), 3);
        assert_eq!(rules.iter().filter(|r| r.enabled).count(), 2);
        assert_eq!(rules[2].kind, RuleKind::Frequency);
    }
}
