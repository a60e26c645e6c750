//! Property-based tests for evaluator invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Determinism: same (snapshot, chain) → identical trace
//! - Arity law: len(chain) == len(intermediate verdicts) + 1
//! - Boolean closure: every verdict is exactly 0 or 1

use proptest::prelude::*;
use rule_engine::{Evaluator, FeatureSnapshot, Rule, RuleChain};

/// Strategy for finite feature values away from degenerate denominators
fn scalar_strategy() -> impl Strategy<Value = f64> {
    (1i64..10_000i64).prop_map(|v| v as f64)
}

/// Strategy for scalar-pair attribute operators that accept any positive input
fn attribute_op_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("difference"),
        Just("product"),
        Just("ratio"),
        Just("mean"),
        Just("variance2"),
    ]
}

fn binary_combinator_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("and"),
        Just("or"),
        Just("xor"),
        Just("implication"),
        Just("nand"),
        Just("nor"),
        Just("equivalence"),
    ]
}

fn ternary_combinator_strategy() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("and3"), Just("or3"), Just("xor3"), Just("implication3")]
}

/// Strategy for a snapshot of n scalar features named f0..fn-1
fn snapshot_strategy(n: usize) -> impl Strategy<Value = FeatureSnapshot> {
    proptest::collection::vec(scalar_strategy(), n).prop_map(|values| {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (format!("f{}", i), v.into()))
            .collect()
    })
}

/// Strategy for a valid chain of `rules` attribute rules over 2*rules features
fn chain_strategy(rules: usize) -> impl Strategy<Value = RuleChain> {
    let combinator = if rules == 2 {
        binary_combinator_strategy().boxed()
    } else {
        ternary_combinator_strategy().boxed()
    };
    (
        proptest::collection::vec((attribute_op_strategy(), 0.0f64..100.0f64), rules),
        combinator,
    )
        .prop_map(move |(attribute_rules, combinator)| {
            let mut out: Vec<Rule> = attribute_rules
                .into_iter()
                .enumerate()
                .map(|(i, (op, threshold))| {
                    Rule::attribute(
                        op,
                        vec![format!("f{}", 2 * i), format!("f{}", 2 * i + 1)],
                        Some(threshold),
                    )
                })
                .collect();
            out.push(Rule::combinator(combinator));
            RuleChain::new(out)
        })
}

proptest! {
    #[test]
    fn evaluation_is_deterministic(
        snapshot in snapshot_strategy(4),
        chain in chain_strategy(2),
    ) {
        let evaluator = Evaluator::with_standard_operators();
        let first = evaluator.evaluate(&snapshot, &chain).unwrap();
        let second = evaluator.evaluate(&snapshot, &chain).unwrap();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn arity_law_holds_for_binary_chains(
        snapshot in snapshot_strategy(4),
        chain in chain_strategy(2),
    ) {
        let evaluator = Evaluator::with_standard_operators();
        let trace = evaluator.evaluate(&snapshot, &chain).unwrap();

        prop_assert_eq!(chain.len(), trace.intermediate_verdicts.len() + 1);
        prop_assert_eq!(trace.steps.len(), chain.len());
    }

    #[test]
    fn arity_law_holds_for_ternary_chains(
        snapshot in snapshot_strategy(6),
        chain in chain_strategy(3),
    ) {
        let evaluator = Evaluator::with_standard_operators();
        let trace = evaluator.evaluate(&snapshot, &chain).unwrap();

        prop_assert_eq!(chain.len(), trace.intermediate_verdicts.len() + 1);
        prop_assert_eq!(trace.intermediate_verdicts.len(), 3);
    }

    #[test]
    fn verdicts_are_boolean_closed(
        snapshot in snapshot_strategy(6),
        chain in chain_strategy(3),
    ) {
        let evaluator = Evaluator::with_standard_operators();
        let trace = evaluator.evaluate(&snapshot, &chain).unwrap();

        for verdict in &trace.intermediate_verdicts {
            prop_assert!(verdict.as_u8() <= 1);
        }
        prop_assert!(trace.final_verdict.as_u8() <= 1);
        for step in &trace.steps {
            prop_assert!(step.verdict.as_u8() <= 1);
        }
    }

    #[test]
    fn trace_survives_json_round_trip(
        snapshot in snapshot_strategy(4),
        chain in chain_strategy(2),
    ) {
        let evaluator = Evaluator::with_standard_operators();
        let trace = evaluator.evaluate(&snapshot, &chain).unwrap();

        let json = serde_json::to_string(&trace).unwrap();
        let restored: rule_engine::ComputationTrace = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(trace, restored);
    }
}
