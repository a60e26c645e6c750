//! Operator registry and operator semantics
//!
//! Two disjoint operator families:
//! - Attribute operators consume raw feature values plus an optional
//!   threshold and emit a 0/1 verdict
//! - Combinator operators consume 2 or 3 prior verdicts and emit the
//!   combined verdict
//!
//! The registry is a statically constructed map from identifier to a tagged
//! operator descriptor. It is built once at startup, is immutable afterwards,
//! and unknown identifiers are detected by a plain map lookup.

use crate::error::{EvaluationError, Result};
use crate::types::Verdict;
use std::collections::{BTreeSet, HashMap};

/// Input shape an operator consumes
///
/// A closed set of variants; the evaluator routes feature resolution by this
/// shape rather than by special-casing operator identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputShape {
    /// Two numeric features
    ScalarPair,
    /// Three numeric features
    ScalarTriple,
    /// Four numeric features interpreted as (x1, y1, x2, y2)
    CoordinatePair2d,
    /// Six numeric features interpreted as (x1, y1, z1, x2, y2, z2)
    CoordinatePair3d,
    /// Two vector features: weights then values, equal length
    WeightedLists,
    /// Two three-element vector features
    VectorPair3d,
    /// Two label-set features
    LabelSetPair,
    /// Two prior verdicts
    VerdictPair,
    /// Three prior verdicts
    VerdictTriple,
}

impl InputShape {
    /// Number of snapshot features a rule of this shape must name
    pub fn feature_count(self) -> usize {
        match self {
            InputShape::ScalarPair
            | InputShape::WeightedLists
            | InputShape::VectorPair3d
            | InputShape::LabelSetPair => 2,
            InputShape::ScalarTriple => 3,
            InputShape::CoordinatePair2d => 4,
            InputShape::CoordinatePair3d => 6,
            InputShape::VerdictPair | InputShape::VerdictTriple => 0,
        }
    }
}

/// Attribute operator: feature values (+ optional threshold) to 0/1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeOp {
    /// 1 if A >= B
    Compare,
    /// 1 if A - B >= threshold
    Difference,
    /// 1 if A * B >= threshold
    Product,
    /// 1 if A / B >= threshold; fails on B == 0
    Ratio,
    /// 1 if (A - B) / B * 100 >= threshold; fails on B == 0
    DifferentialRatio,
    /// 1 if set A is a subset of set B
    Subset,
    /// 1 if (A + B) / 2 >= threshold
    Mean,
    /// 1 if population variance of {A, B} >= threshold
    Variance2,
    /// 1 if 2D Euclidean distance >= threshold
    Euclidean2d,
    /// 1 if 3D Euclidean distance >= threshold
    Euclidean3d,
    /// 1 if the weighted sum of values >= threshold
    WeightedSum,
    /// 1 if |A-B| + |B-C| + |C-A| >= threshold
    CrossDeviation,
    /// 1 if population variance of {A, B, C} >= threshold
    Variance3,
    /// 1 if A * B * C >= threshold
    JointProbability,
    /// 1 if cosine similarity of two 3-vectors >= threshold
    CosineSimilarity3d,
}

/// Combinator operator: 2 or 3 prior verdicts to 0/1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombinatorOp {
    /// Both inputs 1
    And,
    /// Either input 1
    Or,
    /// Inputs differ
    Xor,
    /// Not (A and not B)
    Implication,
    /// Not (A and B)
    Nand,
    /// Neither input 1
    Nor,
    /// Inputs equal
    Equivalence,
    /// All three inputs 1
    And3,
    /// At least one input 1
    Or3,
    /// Odd number of inputs 1
    Xor3,
    /// Not (A and B and not C)
    Implication3,
}

impl CombinatorOp {
    /// Declared verdict arity (2 or 3)
    pub fn arity(self) -> usize {
        match self {
            CombinatorOp::And
            | CombinatorOp::Or
            | CombinatorOp::Xor
            | CombinatorOp::Implication
            | CombinatorOp::Nand
            | CombinatorOp::Nor
            | CombinatorOp::Equivalence => 2,
            CombinatorOp::And3
            | CombinatorOp::Or3
            | CombinatorOp::Xor3
            | CombinatorOp::Implication3 => 3,
        }
    }

    /// Apply the truth table to the ordered intermediate verdicts
    pub fn evaluate(self, id: &str, verdicts: &[Verdict]) -> Result<Verdict> {
        if verdicts.len() != self.arity() {
            return Err(EvaluationError::ArityMismatch {
                operator: id.to_string(),
                detail: format!(
                    "expected {} verdicts, got {}",
                    self.arity(),
                    verdicts.len()
                ),
            });
        }
        let hit = |i: usize| verdicts[i].is_triggered();
        let result = match self {
            CombinatorOp::And => hit(0) && hit(1),
            CombinatorOp::Or => hit(0) || hit(1),
            CombinatorOp::Xor => hit(0) != hit(1),
            CombinatorOp::Implication => !(hit(0) && !hit(1)),
            CombinatorOp::Nand => !(hit(0) && hit(1)),
            CombinatorOp::Nor => !(hit(0) || hit(1)),
            CombinatorOp::Equivalence => hit(0) == hit(1),
            CombinatorOp::And3 => hit(0) && hit(1) && hit(2),
            CombinatorOp::Or3 => hit(0) || hit(1) || hit(2),
            CombinatorOp::Xor3 => {
                (verdicts[0].as_u8() + verdicts[1].as_u8() + verdicts[2].as_u8()) % 2 == 1
            }
            CombinatorOp::Implication3 => !(hit(0) && hit(1) && !hit(2)),
        };
        Ok(Verdict::from_bool(result))
    }
}

/// Typed arguments for an attribute operator, resolved per its shape
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeArgs {
    /// Positional scalars (2 for pairs, 3 for triples, 4/6 for coordinates)
    Scalars(Vec<f64>),
    /// Weight and value lists for `weighted_sum`
    Lists {
        /// Per-value weights
        weights: Vec<f64>,
        /// Feature values, same length as the weights
        values: Vec<f64>,
    },
    /// Two 3-vectors for `cosine_similarity_3d`
    Vectors3 {
        /// First vector
        a: [f64; 3],
        /// Second vector
        b: [f64; 3],
    },
    /// Two label sets for `subset`
    Sets {
        /// Candidate subset
        a: BTreeSet<String>,
        /// Superset to test against
        b: BTreeSet<String>,
    },
}

fn required_threshold(id: &str, threshold: Option<f64>) -> Result<f64> {
    threshold.ok_or_else(|| EvaluationError::ArityMismatch {
        operator: id.to_string(),
        detail: "operator requires a threshold, none supplied".to_string(),
    })
}

fn scalars<const N: usize>(id: &str, args: &AttributeArgs) -> Result<[f64; N]> {
    match args {
        AttributeArgs::Scalars(values) if values.len() == N => {
            let mut out = [0.0; N];
            out.copy_from_slice(values);
            Ok(out)
        }
        other => Err(EvaluationError::MalformedVector {
            operator: id.to_string(),
            detail: format!("expected {} scalar inputs, got {:?}", N, other),
        }),
    }
}

fn population_variance(values: &[f64]) -> f64 {
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

impl AttributeOp {
    /// Apply the operator to resolved arguments
    ///
    /// All thresholds are inclusive (`>=`). Numeric edge cases follow the
    /// catalog contract: ratio-family operators fail on a zero denominator,
    /// weighted lists must be equal length, cosine similarity of a zero
    /// vector is defined as 0.
    pub fn evaluate(self, id: &str, args: &AttributeArgs, threshold: Option<f64>) -> Result<Verdict> {
        match self {
            AttributeOp::Compare => {
                let [a, b] = scalars::<2>(id, args)?;
                Ok(Verdict::from_bool(a >= b))
            }
            AttributeOp::Difference => {
                let [a, b] = scalars::<2>(id, args)?;
                let t = required_threshold(id, threshold)?;
                Ok(Verdict::from_bool(a - b >= t))
            }
            AttributeOp::Product => {
                let [a, b] = scalars::<2>(id, args)?;
                let t = required_threshold(id, threshold)?;
                Ok(Verdict::from_bool(a * b >= t))
            }
            AttributeOp::Ratio => {
                let [a, b] = scalars::<2>(id, args)?;
                let t = required_threshold(id, threshold)?;
                if b == 0.0 {
                    return Err(EvaluationError::DivisionByZero(id.to_string()));
                }
                Ok(Verdict::from_bool(a / b >= t))
            }
            AttributeOp::DifferentialRatio => {
                let [a, b] = scalars::<2>(id, args)?;
                let t = required_threshold(id, threshold)?;
                if b == 0.0 {
                    return Err(EvaluationError::DivisionByZero(id.to_string()));
                }
                Ok(Verdict::from_bool((a - b) / b * 100.0 >= t))
            }
            AttributeOp::Subset => match args {
                AttributeArgs::Sets { a, b } => Ok(Verdict::from_bool(a.is_subset(b))),
                other => Err(EvaluationError::MalformedVector {
                    operator: id.to_string(),
                    detail: format!("expected two label sets, got {:?}", other),
                }),
            },
            AttributeOp::Mean => {
                let [a, b] = scalars::<2>(id, args)?;
                let t = required_threshold(id, threshold)?;
                Ok(Verdict::from_bool((a + b) / 2.0 >= t))
            }
            AttributeOp::Variance2 => {
                let values = scalars::<2>(id, args)?;
                let t = required_threshold(id, threshold)?;
                Ok(Verdict::from_bool(population_variance(&values) >= t))
            }
            AttributeOp::Euclidean2d => {
                let [x1, y1, x2, y2] = scalars::<4>(id, args)?;
                let t = required_threshold(id, threshold)?;
                let distance = (x2 - x1).hypot(y2 - y1);
                Ok(Verdict::from_bool(distance >= t))
            }
            AttributeOp::Euclidean3d => {
                let [x1, y1, z1, x2, y2, z2] = scalars::<6>(id, args)?;
                let t = required_threshold(id, threshold)?;
                let distance =
                    ((x2 - x1).powi(2) + (y2 - y1).powi(2) + (z2 - z1).powi(2)).sqrt();
                Ok(Verdict::from_bool(distance >= t))
            }
            AttributeOp::WeightedSum => match args {
                AttributeArgs::Lists { weights, values } => {
                    let t = required_threshold(id, threshold)?;
                    if weights.len() != values.len() {
                        return Err(EvaluationError::MalformedVector {
                            operator: id.to_string(),
                            detail: format!(
                                "weights length {} does not match values length {}",
                                weights.len(),
                                values.len()
                            ),
                        });
                    }
                    let sum: f64 = weights.iter().zip(values).map(|(w, v)| w * v).sum();
                    Ok(Verdict::from_bool(sum >= t))
                }
                other => Err(EvaluationError::MalformedVector {
                    operator: id.to_string(),
                    detail: format!("expected weight and value lists, got {:?}", other),
                }),
            },
            AttributeOp::CrossDeviation => {
                let [a, b, c] = scalars::<3>(id, args)?;
                let t = required_threshold(id, threshold)?;
                let deviation = (a - b).abs() + (b - c).abs() + (c - a).abs();
                Ok(Verdict::from_bool(deviation >= t))
            }
            AttributeOp::Variance3 => {
                let values = scalars::<3>(id, args)?;
                let t = required_threshold(id, threshold)?;
                Ok(Verdict::from_bool(population_variance(&values) >= t))
            }
            AttributeOp::JointProbability => {
                let [a, b, c] = scalars::<3>(id, args)?;
                let t = required_threshold(id, threshold)?;
                Ok(Verdict::from_bool(a * b * c >= t))
            }
            AttributeOp::CosineSimilarity3d => match args {
                AttributeArgs::Vectors3 { a, b } => {
                    let t = required_threshold(id, threshold)?;
                    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
                    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
                    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
                    // Zero-vector similarity is defined as 0
                    let similarity = if norm_a == 0.0 || norm_b == 0.0 {
                        0.0
                    } else {
                        dot / (norm_a * norm_b)
                    };
                    Ok(Verdict::from_bool(similarity >= t))
                }
                other => Err(EvaluationError::MalformedVector {
                    operator: id.to_string(),
                    detail: format!("expected two 3-vectors, got {:?}", other),
                }),
            },
        }
    }
}

/// Operator family tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    /// Attribute operator over snapshot features
    Attribute(AttributeOp),
    /// Combinator operator over prior verdicts
    Combinator(CombinatorOp),
}

/// Registered operator descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorDef {
    /// Globally unique identifier
    pub id: &'static str,
    /// Declared input shape
    pub shape: InputShape,
    /// Whether the rule must carry a threshold
    pub requires_threshold: bool,
    /// Family and concrete operator
    pub kind: OperatorKind,
}

const CATALOG: &[OperatorDef] = &[
    OperatorDef {
        id: "compare",
        shape: InputShape::ScalarPair,
        requires_threshold: false,
        kind: OperatorKind::Attribute(AttributeOp::Compare),
    },
    OperatorDef {
        id: "difference",
        shape: InputShape::ScalarPair,
        requires_threshold: true,
        kind: OperatorKind::Attribute(AttributeOp::Difference),
    },
    OperatorDef {
        id: "product",
        shape: InputShape::ScalarPair,
        requires_threshold: true,
        kind: OperatorKind::Attribute(AttributeOp::Product),
    },
    OperatorDef {
        id: "ratio",
        shape: InputShape::ScalarPair,
        requires_threshold: true,
        kind: OperatorKind::Attribute(AttributeOp::Ratio),
    },
    OperatorDef {
        id: "differential_ratio",
        shape: InputShape::ScalarPair,
        requires_threshold: true,
        kind: OperatorKind::Attribute(AttributeOp::DifferentialRatio),
    },
    OperatorDef {
        id: "subset",
        shape: InputShape::LabelSetPair,
        requires_threshold: false,
        kind: OperatorKind::Attribute(AttributeOp::Subset),
    },
    OperatorDef {
        id: "mean",
        shape: InputShape::ScalarPair,
        requires_threshold: true,
        kind: OperatorKind::Attribute(AttributeOp::Mean),
    },
    OperatorDef {
        id: "variance2",
        shape: InputShape::ScalarPair,
        requires_threshold: true,
        kind: OperatorKind::Attribute(AttributeOp::Variance2),
    },
    OperatorDef {
        id: "euclidean_2d",
        shape: InputShape::CoordinatePair2d,
        requires_threshold: true,
        kind: OperatorKind::Attribute(AttributeOp::Euclidean2d),
    },
    OperatorDef {
        id: "euclidean_3d",
        shape: InputShape::CoordinatePair3d,
        requires_threshold: true,
        kind: OperatorKind::Attribute(AttributeOp::Euclidean3d),
    },
    OperatorDef {
        id: "weighted_sum",
        shape: InputShape::WeightedLists,
        requires_threshold: true,
        kind: OperatorKind::Attribute(AttributeOp::WeightedSum),
    },
    OperatorDef {
        id: "cross_deviation",
        shape: InputShape::ScalarTriple,
        requires_threshold: true,
        kind: OperatorKind::Attribute(AttributeOp::CrossDeviation),
    },
    OperatorDef {
        id: "variance3",
        shape: InputShape::ScalarTriple,
        requires_threshold: true,
        kind: OperatorKind::Attribute(AttributeOp::Variance3),
    },
    OperatorDef {
        id: "joint_probability",
        shape: InputShape::ScalarTriple,
        requires_threshold: true,
        kind: OperatorKind::Attribute(AttributeOp::JointProbability),
    },
    OperatorDef {
        id: "cosine_similarity_3d",
        shape: InputShape::VectorPair3d,
        requires_threshold: true,
        kind: OperatorKind::Attribute(AttributeOp::CosineSimilarity3d),
    },
    OperatorDef {
        id: "and",
        shape: InputShape::VerdictPair,
        requires_threshold: false,
        kind: OperatorKind::Combinator(CombinatorOp::And),
    },
    OperatorDef {
        id: "or",
        shape: InputShape::VerdictPair,
        requires_threshold: false,
        kind: OperatorKind::Combinator(CombinatorOp::Or),
    },
    OperatorDef {
        id: "xor",
        shape: InputShape::VerdictPair,
        requires_threshold: false,
        kind: OperatorKind::Combinator(CombinatorOp::Xor),
    },
    OperatorDef {
        id: "implication",
        shape: InputShape::VerdictPair,
        requires_threshold: false,
        kind: OperatorKind::Combinator(CombinatorOp::Implication),
    },
    OperatorDef {
        id: "nand",
        shape: InputShape::VerdictPair,
        requires_threshold: false,
        kind: OperatorKind::Combinator(CombinatorOp::Nand),
    },
    OperatorDef {
        id: "nor",
        shape: InputShape::VerdictPair,
        requires_threshold: false,
        kind: OperatorKind::Combinator(CombinatorOp::Nor),
    },
    OperatorDef {
        id: "equivalence",
        shape: InputShape::VerdictPair,
        requires_threshold: false,
        kind: OperatorKind::Combinator(CombinatorOp::Equivalence),
    },
    OperatorDef {
        id: "and3",
        shape: InputShape::VerdictTriple,
        requires_threshold: false,
        kind: OperatorKind::Combinator(CombinatorOp::And3),
    },
    OperatorDef {
        id: "or3",
        shape: InputShape::VerdictTriple,
        requires_threshold: false,
        kind: OperatorKind::Combinator(CombinatorOp::Or3),
    },
    OperatorDef {
        id: "xor3",
        shape: InputShape::VerdictTriple,
        requires_threshold: false,
        kind: OperatorKind::Combinator(CombinatorOp::Xor3),
    },
    OperatorDef {
        id: "implication3",
        shape: InputShape::VerdictTriple,
        requires_threshold: false,
        kind: OperatorKind::Combinator(CombinatorOp::Implication3),
    },
];

/// Read-only mapping from operator identifier to descriptor
///
/// Built once at process start; safe to share unsynchronized across
/// concurrent evaluations.
#[derive(Debug, Clone)]
pub struct OperatorRegistry {
    defs: HashMap<&'static str, OperatorDef>,
}

impl OperatorRegistry {
    /// Build the standard operator catalog
    pub fn standard() -> Self {
        let defs = CATALOG.iter().map(|def| (def.id, *def)).collect();
        Self { defs }
    }

    /// Resolve an identifier by exact string match
    pub fn resolve(&self, id: &str) -> Option<&OperatorDef> {
        self.defs.get(id)
    }

    /// Whether the identifier is registered
    pub fn contains(&self, id: &str) -> bool {
        self.defs.contains_key(id)
    }

    /// Number of registered operators
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Registered identifiers, unordered
    pub fn ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.defs.keys().copied()
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
