//! Prompt construction for the explanation collaborator
//!
//! Pure functions over the snapshot and trace, unit-testable without any
//! network access.

use rule_engine::{ComputationTrace, FeatureSnapshot};
use std::fmt::Write;

/// System instruction sent ahead of every explanation request
pub const SYSTEM_PROMPT: &str = "You are a professional risk analyst specialising in \
multi-dimensional customs risk identification and semantic description.";

/// Build the user prompt describing the evaluation to explain
///
/// Mirrors the audit structure: original features, per-step calculation
/// process, final indicator, followed by the reporting instructions.
pub fn build_prompt(snapshot: &FeatureSnapshot, trace: &ComputationTrace) -> String {
    let features = serde_json::to_string(snapshot).unwrap_or_else(|_| "{}".to_string());

    let mut process = String::new();
    for step in &trace.steps {
        let _ = writeln!(process, "Step {}: {}", step.step, step.description);
    }

    format!(
        "Based on the following multi-dimensional risk feature analysis, produce a \
detailed risk description.\n\n\
[Original risk features]\n{features}\n\n\
[Calculation process]\n{process}\n\
[Final risk indicator]\n{indicator}\n\n\
Requirements:\n\
1. Identify the risk type (e.g. misdeclaration, transport violation, declaration anomaly).\n\
2. Analyse the concrete risk manifestation, based on the conditions triggered above.\n\
3. Assess the potential threat and impact on transport, environmental and trade safety.\n\
4. Recommend a response (e.g. manual inspection, licence tracing, route verification).",
        features = features,
        process = process,
        indicator = trace.final_verdict.as_u8(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rule_engine::{Evaluator, Rule, RuleChain};

    fn sample_trace() -> (FeatureSnapshot, ComputationTrace) {
        let mut snapshot = FeatureSnapshot::new();
        snapshot.insert("申报重量", 55.0);
        snapshot.insert("限重", 50.0);
        snapshot.insert("申报价格", 100.0);
        snapshot.insert("参考价格", 80.0);

        let chain = RuleChain::new(vec![
            Rule::attribute(
                "difference",
                vec!["申报重量".into(), "限重".into()],
                Some(0.0),
            ),
            Rule::attribute(
                "ratio",
                vec!["申报价格".into(), "参考价格".into()],
                Some(1.2),
            ),
            Rule::combinator("and"),
        ]);

        let trace = Evaluator::with_standard_operators()
            .evaluate(&snapshot, &chain)
            .unwrap();
        (snapshot, trace)
    }

    #[test]
    fn prompt_contains_steps_and_indicator() {
        let (snapshot, trace) = sample_trace();
        let prompt = build_prompt(&snapshot, &trace);

        assert!(prompt.contains("申报重量"));
        assert!(prompt.contains("Step 1:"));
        assert!(prompt.contains("Step 3:"));
        assert!(prompt.contains("[Final risk indicator]\n1"));
    }

    #[test]
    fn prompt_is_deterministic() {
        let (snapshot, trace) = sample_trace();
        assert_eq!(
            build_prompt(&snapshot, &trace),
            build_prompt(&snapshot, &trace)
        );
    }
}
