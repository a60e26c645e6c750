//! Calculation steps and the computation trace
//!
//! The trace builder only shapes step records and renders descriptions. A
//! rendering gap (operator without a dedicated template) falls back to a
//! generic description and never aborts evaluation.

use crate::types::{FeatureSnapshot, FeatureValue, RiskLevel, Rule, RuleChain, Verdict};
use serde::{Deserialize, Serialize};

/// Inputs a calculation step consumed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepInputs {
    /// Resolved feature values in positional order (attribute steps)
    Features(Vec<(String, FeatureValue)>),
    /// Prior verdicts in chain order (terminal step)
    Verdicts(Vec<Verdict>),
}

/// One record per evaluated rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationStep {
    /// 1-based sequence index
    pub step: usize,

    /// Operator identifier applied at this step
    pub operator: String,

    /// Resolved inputs
    pub inputs: StepInputs,

    /// Threshold, where the rule carried one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,

    /// 0/1 verdict of this step
    pub verdict: Verdict,

    /// Rendered human-readable description
    pub description: String,
}

/// Full audit record of one evaluation
///
/// Created fresh per call, immutable once returned, owned by the caller.
/// Contains no timestamps or identifiers, so identical inputs yield
/// byte-identical traces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationTrace {
    /// The original feature snapshot
    pub features: FeatureSnapshot,

    /// Ordered calculation steps, terminal step last
    pub steps: Vec<CalculationStep>,

    /// Verdicts of the attribute rules, in chain order
    pub intermediate_verdicts: Vec<Verdict>,

    /// The final risk indicator
    pub final_verdict: Verdict,

    /// The rule chain that produced this trace
    pub rules_applied: Vec<Rule>,
}

impl ComputationTrace {
    /// Risk level label derived from the final verdict
    pub fn risk_level(&self) -> RiskLevel {
        RiskLevel::from(self.final_verdict)
    }
}

/// Accumulates step records during one evaluation
#[derive(Debug, Default)]
pub struct TraceBuilder {
    steps: Vec<CalculationStep>,
    intermediate: Vec<Verdict>,
}

impl TraceBuilder {
    /// Start an empty trace
    pub fn new() -> Self {
        Self::default()
    }

    /// Verdicts recorded so far, in order
    pub fn intermediate_verdicts(&self) -> &[Verdict] {
        &self.intermediate
    }

    /// Record one attribute-rule step
    pub fn record_attribute_step(
        &mut self,
        rule: &Rule,
        inputs: Vec<(String, FeatureValue)>,
        verdict: Verdict,
    ) {
        let description =
            describe_attribute(&rule.operator, &rule.features, rule.threshold, verdict);
        self.steps.push(CalculationStep {
            step: self.steps.len() + 1,
            operator: rule.operator.clone(),
            inputs: StepInputs::Features(inputs),
            threshold: rule.threshold,
            verdict,
            description,
        });
        self.intermediate.push(verdict);
    }

    /// Record the terminal combinator step
    pub fn record_terminal_step(&mut self, rule: &Rule, inputs: Vec<Verdict>, verdict: Verdict) {
        let description = describe_terminal(&rule.operator, &inputs, verdict);
        self.steps.push(CalculationStep {
            step: self.steps.len() + 1,
            operator: rule.operator.clone(),
            inputs: StepInputs::Verdicts(inputs),
            threshold: None,
            verdict,
            description,
        });
    }

    /// Assemble the final trace
    pub fn finish(
        self,
        snapshot: &FeatureSnapshot,
        chain: &RuleChain,
        final_verdict: Verdict,
    ) -> ComputationTrace {
        ComputationTrace {
            features: snapshot.clone(),
            steps: self.steps,
            intermediate_verdicts: self.intermediate,
            final_verdict,
            rules_applied: chain.rules().to_vec(),
        }
    }
}

fn threshold_clause(threshold: Option<f64>) -> String {
    match threshold {
        Some(t) => format!(", checked against threshold {}", t),
        None => String::new(),
    }
}

/// Render the description for an attribute step
///
/// Templates exist for the common operators; anything else gets the generic
/// "applied operator" form. Rendering never fails.
pub(crate) fn describe_attribute(
    operator: &str,
    features: &[String],
    threshold: Option<f64>,
    verdict: Verdict,
) -> String {
    let name = |i: usize| features.get(i).map(String::as_str).unwrap_or("?");
    let base = match operator {
        "compare" => format!("compared {} against {}", name(0), name(1)),
        "difference" => format!(
            "computed the difference of {} and {}{}",
            name(0),
            name(1),
            threshold_clause(threshold)
        ),
        "ratio" => format!(
            "computed the ratio of {} to {}{}",
            name(0),
            name(1),
            threshold_clause(threshold)
        ),
        "mean" => format!(
            "computed the mean of {} and {}{}",
            name(0),
            name(1),
            threshold_clause(threshold)
        ),
        "weighted_sum" => format!(
            "computed the weighted sum of {} over {}{}",
            name(1),
            name(0),
            threshold_clause(threshold)
        ),
        "subset" => format!("checked whether {} is a subset of {}", name(0), name(1)),
        other => format!("applied operator {}{}", other, threshold_clause(threshold)),
    };
    let outcome = if verdict.is_triggered() {
        "condition met"
    } else {
        "condition not met"
    };
    format!("{}; {}", base, outcome)
}

/// Render the description for the terminal combinator step
pub(crate) fn describe_terminal(operator: &str, inputs: &[Verdict], verdict: Verdict) -> String {
    let bits: Vec<u8> = inputs.iter().map(|v| v.as_u8()).collect();
    let base = match operator {
        "and" | "and3" => format!("logical AND over {:?}: all conditions must hold", bits),
        "or" | "or3" => format!("logical OR over {:?}: any condition suffices", bits),
        other => format!("applied combinator {} over {:?}", other, bits),
    };
    let outcome = if verdict.is_triggered() {
        "risk triggered"
    } else {
        "risk not triggered"
    };
    format!("{}; final verdict: {}", base, outcome)
}
