//! Two-phase rule-chain evaluator
//!
//! Phase one runs the attribute rules in order against the snapshot; phase
//! two folds the intermediate verdicts through the terminal combinator. The
//! evaluator is a pure function of (snapshot, chain): identical inputs yield
//! identical traces.

use crate::error::{EvaluationError, Result};
use crate::operators::{
    AttributeArgs, AttributeOp, InputShape, OperatorDef, OperatorKind, OperatorRegistry,
};
use crate::trace::{ComputationTrace, TraceBuilder};
use crate::types::{FeatureSnapshot, FeatureValue, Rule, RuleChain, Verdict};
use tracing::debug;

/// Rule-chain evaluator over an immutable operator registry
#[derive(Debug, Clone)]
pub struct Evaluator {
    registry: OperatorRegistry,
}

impl Evaluator {
    /// Create an evaluator over the given registry
    pub fn new(registry: OperatorRegistry) -> Self {
        Self { registry }
    }

    /// Create an evaluator over the standard operator catalog
    pub fn with_standard_operators() -> Self {
        Self::new(OperatorRegistry::standard())
    }

    /// The registry this evaluator resolves against
    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    /// Evaluate a rule chain against a feature snapshot
    ///
    /// Fails fast: the chain shape and every operator identifier are
    /// validated before any step is computed, so no partial trace can leak
    /// out of a malformed chain.
    pub fn evaluate(
        &self,
        snapshot: &FeatureSnapshot,
        chain: &RuleChain,
    ) -> Result<ComputationTrace> {
        self.validate_chain(chain)?;

        let mut builder = TraceBuilder::new();

        for rule in chain.attribute_rules() {
            let def = self.resolve(&rule.operator)?;
            let op = match def.kind {
                OperatorKind::Attribute(op) => op,
                // validate_chain already rejected combinators here
                OperatorKind::Combinator(_) => {
                    return Err(EvaluationError::UnsupportedChainShape(format!(
                        "combinator {} used before the terminal position",
                        rule.operator
                    )))
                }
            };
            let verdict = self.evaluate_attribute_rule(snapshot, rule, def, op)?;
            let inputs = resolve_step_inputs(snapshot, rule)?;
            builder.record_attribute_step(rule, inputs, verdict);
        }

        // Chain shape was validated, terminal rule exists
        let terminal = chain
            .terminal_rule()
            .ok_or_else(|| EvaluationError::UnsupportedChainShape("empty chain".to_string()))?;
        let def = self.resolve(&terminal.operator)?;
        let combinator = match def.kind {
            OperatorKind::Combinator(op) => op,
            OperatorKind::Attribute(_) => {
                return Err(EvaluationError::UnsupportedChainShape(format!(
                    "terminal rule {} is not a combinator",
                    terminal.operator
                )))
            }
        };

        let intermediate = builder.intermediate_verdicts().to_vec();
        let final_verdict = combinator.evaluate(def.id, &intermediate)?;
        builder.record_terminal_step(terminal, intermediate, final_verdict);

        debug!(
            steps = chain.len(),
            indicator = final_verdict.as_u8(),
            "rule chain evaluated"
        );

        Ok(builder.finish(snapshot, chain, final_verdict))
    }

    fn resolve(&self, operator: &str) -> Result<&OperatorDef> {
        self.registry
            .resolve(operator)
            .ok_or_else(|| EvaluationError::UnknownOperator(operator.to_string()))
    }

    /// Validate chain length, operator identifiers, family placement and
    /// terminal arity before computing anything
    fn validate_chain(&self, chain: &RuleChain) -> Result<()> {
        if chain.len() < 2 {
            return Err(EvaluationError::UnsupportedChainShape(format!(
                "chain must contain at least 2 rules, got {}",
                chain.len()
            )));
        }

        for rule in chain.attribute_rules() {
            let def = self.resolve(&rule.operator)?;
            if matches!(def.kind, OperatorKind::Combinator(_)) {
                return Err(EvaluationError::UnsupportedChainShape(format!(
                    "combinator {} used before the terminal position",
                    rule.operator
                )));
            }
        }

        // Terminal rule exists since len >= 2
        let terminal = chain
            .terminal_rule()
            .ok_or_else(|| EvaluationError::UnsupportedChainShape("empty chain".to_string()))?;
        let def = self.resolve(&terminal.operator)?;
        let combinator = match def.kind {
            OperatorKind::Combinator(op) => op,
            OperatorKind::Attribute(_) => {
                return Err(EvaluationError::UnsupportedChainShape(format!(
                    "terminal rule {} is not a combinator",
                    terminal.operator
                )))
            }
        };

        // Only binary and ternary combinations are supported
        let attribute_count = chain.len() - 1;
        if combinator.arity() != attribute_count {
            return Err(EvaluationError::UnsupportedChainShape(format!(
                "terminal combinator {} expects {} verdicts but the chain produces {}",
                terminal.operator,
                combinator.arity(),
                attribute_count
            )));
        }

        Ok(())
    }

    fn evaluate_attribute_rule(
        &self,
        snapshot: &FeatureSnapshot,
        rule: &Rule,
        def: &OperatorDef,
        op: AttributeOp,
    ) -> Result<Verdict> {
        let expected = def.shape.feature_count();
        if rule.features.len() != expected {
            return Err(EvaluationError::ArityMismatch {
                operator: rule.operator.clone(),
                detail: format!(
                    "expected {} feature names, got {}",
                    expected,
                    rule.features.len()
                ),
            });
        }
        if def.requires_threshold && rule.threshold.is_none() {
            return Err(EvaluationError::ArityMismatch {
                operator: rule.operator.clone(),
                detail: "operator requires a threshold, none supplied".to_string(),
            });
        }

        let args = self.resolve_args(snapshot, rule, def.shape)?;
        op.evaluate(def.id, &args, rule.threshold)
    }

    /// Route snapshot values into typed arguments per the declared shape
    fn resolve_args(
        &self,
        snapshot: &FeatureSnapshot,
        rule: &Rule,
        shape: InputShape,
    ) -> Result<AttributeArgs> {
        let op = rule.operator.as_str();
        match shape {
            InputShape::ScalarPair
            | InputShape::ScalarTriple
            | InputShape::CoordinatePair2d
            | InputShape::CoordinatePair3d => {
                let values = rule
                    .features
                    .iter()
                    .map(|name| resolve_scalar(snapshot, op, name))
                    .collect::<Result<Vec<f64>>>()?;
                Ok(AttributeArgs::Scalars(values))
            }
            InputShape::WeightedLists => {
                let weights = resolve_vector(snapshot, op, &rule.features[0])?;
                let values = resolve_vector(snapshot, op, &rule.features[1])?;
                Ok(AttributeArgs::Lists { weights, values })
            }
            InputShape::VectorPair3d => {
                let a = resolve_vector3(snapshot, op, &rule.features[0])?;
                let b = resolve_vector3(snapshot, op, &rule.features[1])?;
                Ok(AttributeArgs::Vectors3 { a, b })
            }
            InputShape::LabelSetPair => {
                let a = resolve_labels(snapshot, op, &rule.features[0])?;
                let b = resolve_labels(snapshot, op, &rule.features[1])?;
                Ok(AttributeArgs::Sets { a, b })
            }
            InputShape::VerdictPair | InputShape::VerdictTriple => {
                Err(EvaluationError::UnsupportedChainShape(format!(
                    "combinator {} used before the terminal position",
                    op
                )))
            }
        }
    }
}

fn resolve_feature<'a>(
    snapshot: &'a FeatureSnapshot,
    name: &str,
) -> Result<&'a FeatureValue> {
    snapshot
        .get(name)
        .ok_or_else(|| EvaluationError::MissingFeature(name.to_string()))
}

fn resolve_scalar(snapshot: &FeatureSnapshot, operator: &str, name: &str) -> Result<f64> {
    match resolve_feature(snapshot, name)? {
        FeatureValue::Number(value) => Ok(*value),
        other => Err(EvaluationError::MalformedVector {
            operator: operator.to_string(),
            detail: format!("feature {} is not numeric: {:?}", name, other),
        }),
    }
}

fn resolve_vector(snapshot: &FeatureSnapshot, operator: &str, name: &str) -> Result<Vec<f64>> {
    match resolve_feature(snapshot, name)? {
        FeatureValue::Vector(values) => Ok(values.clone()),
        other => Err(EvaluationError::MalformedVector {
            operator: operator.to_string(),
            detail: format!("feature {} is not a vector: {:?}", name, other),
        }),
    }
}

fn resolve_vector3(snapshot: &FeatureSnapshot, operator: &str, name: &str) -> Result<[f64; 3]> {
    let values = resolve_vector(snapshot, operator, name)?;
    <[f64; 3]>::try_from(values.as_slice()).map_err(|_| EvaluationError::MalformedVector {
        operator: operator.to_string(),
        detail: format!("feature {} must be a 3-vector, got {} elements", name, values.len()),
    })
}

fn resolve_labels(
    snapshot: &FeatureSnapshot,
    operator: &str,
    name: &str,
) -> Result<std::collections::BTreeSet<String>> {
    match resolve_feature(snapshot, name)? {
        FeatureValue::Labels(labels) => Ok(labels.clone()),
        other => Err(EvaluationError::MalformedVector {
            operator: operator.to_string(),
            detail: format!("feature {} is not a label set: {:?}", name, other),
        }),
    }
}

/// Clone the resolved (name, value) pairs in positional order for the step
/// record
fn resolve_step_inputs(
    snapshot: &FeatureSnapshot,
    rule: &Rule,
) -> Result<Vec<(String, FeatureValue)>> {
    rule.features
        .iter()
        .map(|name| {
            resolve_feature(snapshot, name).map(|value| (name.clone(), value.clone()))
        })
        .collect()
}
