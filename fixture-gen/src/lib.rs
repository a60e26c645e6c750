//! Synthetic snapshot and rule-chain generator
//!
//! Produces customs-flavoured feature snapshots paired with valid rule
//! chains for load and correctness testing. Generation is seeded so that a
//! fixture set is reproducible. Not part of the runtime evaluation path.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rule_engine::{FeatureSnapshot, Rule, RuleChain};
use serde::{Deserialize, Serialize};

/// Customs declaration attributes used as feature names
const CUSTOMS_ATTRIBUTES: &[&str] = &[
    "申报重量",
    "限重",
    "申报价格",
    "参考价格",
    "货物价值",
    "关税税率",
    "增值税率",
    "历史违规次数",
    "企业信用分",
    "运输温度",
];

/// Scalar-pair operators safe for arbitrary positive feature values
const ATTRIBUTE_OPERATORS: &[&str] =
    &["compare", "difference", "product", "ratio", "mean", "variance2"];

const BINARY_COMBINATORS: &[&str] =
    &["and", "or", "xor", "implication", "nand", "nor", "equivalence"];

const TERNARY_COMBINATORS: &[&str] = &["and3", "or3", "xor3", "implication3"];

/// One generated snapshot/rule-chain pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    /// Feature snapshot
    pub features: FeatureSnapshot,
    /// Rule chain, always valid against the standard registry
    pub rules: Vec<Rule>,
}

impl Fixture {
    /// The rules as a chain ready for evaluation
    pub fn chain(&self) -> RuleChain {
        RuleChain::new(self.rules.clone())
    }
}

/// Seeded fixture generator
pub struct FixtureGenerator {
    rng: StdRng,
}

impl FixtureGenerator {
    /// Create a generator from a seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate one fixture with 2 or 3 attribute rules and a matching
    /// combinator
    ///
    /// Feature values are positive, so ratio denominators are never zero and
    /// every generated chain evaluates without error.
    pub fn generate(&mut self) -> Fixture {
        let mut features = FeatureSnapshot::new();
        for name in CUSTOMS_ATTRIBUTES {
            let value: f64 = self.rng.gen_range(1.0..1000.0);
            features.insert(*name, (value * 100.0).round() / 100.0);
        }

        let rule_count = if self.rng.gen_bool(0.5) { 2 } else { 3 };
        let mut rules = Vec::with_capacity(rule_count + 1);
        for _ in 0..rule_count {
            let operator = *ATTRIBUTE_OPERATORS
                .choose(&mut self.rng)
                .unwrap_or(&"compare");
            let pair: Vec<String> = CUSTOMS_ATTRIBUTES
                .choose_multiple(&mut self.rng, 2)
                .map(|s| s.to_string())
                .collect();
            let threshold = if operator == "compare" {
                None
            } else {
                Some((self.rng.gen_range(0.0..500.0f64) * 100.0).round() / 100.0)
            };
            rules.push(Rule::attribute(operator, pair, threshold));
        }

        let combinator = if rule_count == 2 {
            *BINARY_COMBINATORS.choose(&mut self.rng).unwrap_or(&"and")
        } else {
            *TERNARY_COMBINATORS.choose(&mut self.rng).unwrap_or(&"and3")
        };
        rules.push(Rule::combinator(combinator));

        Fixture { features, rules }
    }

    /// Generate a batch of fixtures
    pub fn generate_batch(&mut self, count: usize) -> Vec<Fixture> {
        (0..count).map(|_| self.generate()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rule_engine::Evaluator;

    #[test]
    fn generation_is_reproducible() {
        let mut first = FixtureGenerator::new(42);
        let mut second = FixtureGenerator::new(42);

        for _ in 0..20 {
            let a = first.generate();
            let b = second.generate();
            assert_eq!(a.features, b.features);
            assert_eq!(a.rules, b.rules);
        }
    }

    #[test]
    fn generated_fixtures_always_evaluate() {
        let evaluator = Evaluator::with_standard_operators();
        let mut generator = FixtureGenerator::new(7);

        for fixture in generator.generate_batch(200) {
            let trace = evaluator
                .evaluate(&fixture.features, &fixture.chain())
                .unwrap();
            assert_eq!(trace.steps.len(), fixture.rules.len());
            assert!(trace.final_verdict.as_u8() <= 1);
        }
    }

    #[test]
    fn chains_end_in_a_matching_combinator() {
        let mut generator = FixtureGenerator::new(99);
        for fixture in generator.generate_batch(50) {
            let terminal = fixture.rules.last().unwrap();
            assert!(terminal.features.is_empty());
            let attribute_count = fixture.rules.len() - 1;
            assert!(attribute_count == 2 || attribute_count == 3);
            if attribute_count == 2 {
                assert!(BINARY_COMBINATORS.contains(&terminal.operator.as_str()));
            } else {
                assert!(TERNARY_COMBINATORS.contains(&terminal.operator.as_str()));
            }
        }
    }

    #[test]
    fn fixtures_serialize_to_json() {
        let mut generator = FixtureGenerator::new(1);
        let fixture = generator.generate();
        let json = serde_json::to_string(&fixture).unwrap();
        let restored: Fixture = serde_json::from_str(&json).unwrap();
        assert_eq!(fixture.rules, restored.rules);
    }
}
