//! Core types for the rule engine

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A single feature value resolved from the snapshot
///
/// JSON representation is untagged: `55`, `[0.5, 0.5]`, `["A", "B"]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// A real number
    Number(f64),
    /// A finite ordered list of real numbers (vector / weighted operators)
    Vector(Vec<f64>),
    /// A set of discrete labels (subset / categorical operators)
    Labels(BTreeSet<String>),
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Number(value)
    }
}

impl From<Vec<f64>> for FeatureValue {
    fn from(value: Vec<f64>) -> Self {
        FeatureValue::Vector(value)
    }
}

/// Immutable mapping from feature name to feature value
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureSnapshot(BTreeMap<String, FeatureValue>);

impl FeatureSnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a feature value, replacing any previous value of the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) {
        self.0.insert(name.into(), value.into());
    }

    /// Look up a feature by name
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.0.get(name)
    }

    /// Number of features in the snapshot
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the snapshot has no features
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, FeatureValue)> for FeatureSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, FeatureValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A 0/1 verdict produced by an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Verdict(u8);

impl Verdict {
    /// Condition met / risk triggered
    pub const HIT: Verdict = Verdict(1);

    /// Condition not met
    pub const CLEAR: Verdict = Verdict(0);

    /// Build a verdict from a boolean condition
    pub fn from_bool(condition: bool) -> Self {
        if condition {
            Verdict::HIT
        } else {
            Verdict::CLEAR
        }
    }

    /// Raw 0/1 value
    pub fn as_u8(self) -> u8 {
        self.0
    }

    /// Whether the verdict is 1
    pub fn is_triggered(self) -> bool {
        self.0 == 1
    }
}

/// Risk level label derived from the final verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Final indicator was 1
    High,
    /// Final indicator was 0
    Clear,
}

impl From<Verdict> for RiskLevel {
    fn from(verdict: Verdict) -> Self {
        if verdict.is_triggered() {
            RiskLevel::High
        } else {
            RiskLevel::Clear
        }
    }
}

impl RiskLevel {
    /// Stable string form for response payloads
    pub fn as_str(&self) -> &str {
        match self {
            RiskLevel::High => "HIGH",
            RiskLevel::Clear => "CLEAR",
        }
    }
}

/// One rule in a chain
///
/// Attribute rules name the snapshot features they consume, in positional
/// order, plus an optional threshold. Combinator rules have an empty feature
/// list and operate on the prior verdicts instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Operator identifier, resolved against the registry
    pub operator: String,

    /// Ordered feature names; order determines positional argument order
    #[serde(default)]
    pub features: Vec<String>,

    /// Threshold value, where the operator requires one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

impl Rule {
    /// Build an attribute rule
    pub fn attribute(
        operator: impl Into<String>,
        features: Vec<String>,
        threshold: Option<f64>,
    ) -> Self {
        Self {
            operator: operator.into(),
            features,
            threshold,
        }
    }

    /// Build a terminal combinator rule
    pub fn combinator(operator: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            features: Vec::new(),
            threshold: None,
        }
    }
}

/// Ordered attribute rules followed by one terminal combinator rule
///
/// Shape validation (length, terminal arity) happens at evaluation time so
/// that malformed chains surface typed errors rather than panics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleChain(Vec<Rule>);

impl RuleChain {
    /// Wrap an ordered rule list
    pub fn new(rules: Vec<Rule>) -> Self {
        Self(rules)
    }

    /// All rules in order
    pub fn rules(&self) -> &[Rule] {
        &self.0
    }

    /// Rules before the terminal combinator
    pub fn attribute_rules(&self) -> &[Rule] {
        match self.0.len() {
            0 => &[],
            n => &self.0[..n - 1],
        }
    }

    /// The terminal combinator rule, if the chain is non-empty
    pub fn terminal_rule(&self) -> Option<&Rule> {
        self.0.last()
    }

    /// Number of rules in the chain
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the chain is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_value_untagged_json() {
        let number: FeatureValue = serde_json::from_str("55").unwrap();
        assert_eq!(number, FeatureValue::Number(55.0));

        let vector: FeatureValue = serde_json::from_str("[0.5, 0.3, 0.2]").unwrap();
        assert_eq!(vector, FeatureValue::Vector(vec![0.5, 0.3, 0.2]));

        let labels: FeatureValue = serde_json::from_str(r#"["A", "B"]"#).unwrap();
        match labels {
            FeatureValue::Labels(set) => {
                assert!(set.contains("A"));
                assert!(set.contains("B"));
            }
            other => panic!("expected labels, got {:?}", other),
        }
    }

    #[test]
    fn snapshot_lookup_by_name() {
        let mut snapshot = FeatureSnapshot::new();
        snapshot.insert("申报重量", 55.0);
        snapshot.insert("限重", 50.0);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("申报重量"), Some(&FeatureValue::Number(55.0)));
        assert_eq!(snapshot.get("不存在"), None);
    }

    #[test]
    fn verdict_is_binary() {
        assert_eq!(Verdict::from_bool(true).as_u8(), 1);
        assert_eq!(Verdict::from_bool(false).as_u8(), 0);
        assert!(Verdict::HIT.is_triggered());
        assert!(!Verdict::CLEAR.is_triggered());
    }

    #[test]
    fn risk_level_from_verdict() {
        assert_eq!(RiskLevel::from(Verdict::HIT), RiskLevel::High);
        assert_eq!(RiskLevel::from(Verdict::CLEAR), RiskLevel::Clear);
        assert_eq!(RiskLevel::High.as_str(), "HIGH");
    }

    #[test]
    fn chain_splits_terminal_rule() {
        let chain = RuleChain::new(vec![
            Rule::attribute("difference", vec!["a".into(), "b".into()], Some(0.0)),
            Rule::attribute("ratio", vec!["c".into(), "d".into()], Some(1.2)),
            Rule::combinator("and"),
        ]);

        assert_eq!(chain.attribute_rules().len(), 2);
        assert_eq!(chain.terminal_rule().unwrap().operator, "and");
    }

    #[test]
    fn rule_json_defaults() {
        let rule: Rule = serde_json::from_str(r#"{"operator": "and"}"#).unwrap();
        assert!(rule.features.is_empty());
        assert!(rule.threshold.is_none());
    }
}
