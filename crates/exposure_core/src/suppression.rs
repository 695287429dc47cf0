//! Declarative per-desk/measure suppression rules.
//!
//! A matching rule makes the engine treat a fetched measure as empty, so it
//! is reported missing. Rules are data: adding an override never needs a
//! code change.

use serde::{Deserialize, Serialize};

/// Suppress `measures` for `desk`, optionally only from one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuppressionRule {
    /// Desk display name
    pub desk: String,

    /// Source identifier; the rule applies to every source when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Canonical measure names
    pub measures: Vec<String>,
}

impl SuppressionRule {
    /// Whether this rule covers (`desk`, `source`, `measure`).
    pub fn matches(&self, desk: &str, source: &str, measure: &str) -> bool {
        self.desk == desk
            && self.source.as_deref().map_or(true, |s| s == source)
            && self.measures.iter().any(|m| m == measure)
    }
}

/// Rule table consulted once per fetched measure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SuppressionRules {
    rules: Vec<SuppressionRule>,
}

impl SuppressionRules {
    /// Empty table (suppresses nothing).
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Add a rule.
    pub fn with_rule(mut self, rule: SuppressionRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Whether any rule covers (`desk`, `source`, `measure`).
    pub fn suppresses(&self, desk: &str, source: &str, measure: &str) -> bool {
        self.rules.iter().any(|r| r.matches(desk, source, measure))
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[SuppressionRule] {
        &self.rules
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl From<Vec<SuppressionRule>> for SuppressionRules {
    fn from(rules: Vec<SuppressionRule>) -> Self {
        Self { rules }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_matching() {
        let rules = SuppressionRules::new()
            .with_rule(SuppressionRule {
                desk: "GLOBAL RATES".to_string(),
                source: None,
                measures: vec!["IR Delta".to_string(), "IR Vega".to_string()],
            })
            .with_rule(SuppressionRule {
                desk: "GLOBAL NON-LINEAR-EMEA STRUCTURED RATES".to_string(),
                source: Some("legacy".to_string()),
                measures: vec!["IR Delta".to_string()],
            });

        assert!(rules.suppresses("GLOBAL RATES", "cirt_rra", "IR Vega"));
        assert!(rules.suppresses("GLOBAL RATES", "legacy", "IR Delta"));
        assert!(!rules.suppresses("GLOBAL RATES", "legacy", "Inflation Delta"));
        assert!(rules.suppresses("GLOBAL NON-LINEAR-EMEA STRUCTURED RATES", "legacy", "IR Delta"));
        assert!(!rules.suppresses("GLOBAL NON-LINEAR-EMEA STRUCTURED RATES", "cirt_rra", "IR Delta"));
    }

    #[test]
    fn test_default_suppresses_nothing() {
        assert!(!SuppressionRules::default().suppresses("AMRS LINEAR RATES", "cirt_rra", "IR01"));
    }
}
