//! Declarative risk-detection rule engine for customs screening
//!
//! Evaluates rule chains against a named feature snapshot and produces a
//! binary risk indicator together with a fully auditable computation trace:
//! - Attribute operators map raw feature values to 0/1 verdicts
//! - A terminal combinator folds the intermediate verdicts into the final one
//! - Every comparison is recorded as a calculation step with a rendered
//!   description, so the verdict can be reconstructed after the fact
//!
//! The engine is pure and synchronous: no I/O, no shared mutable state. The
//! operator registry is built once and is safe to share across concurrent
//! evaluations without locking.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod evaluator;
pub mod operators;
pub mod trace;
pub mod types;

pub use error::{EvaluationError, Result};
pub use evaluator::Evaluator;
pub use operators::{AttributeOp, CombinatorOp, InputShape, OperatorDef, OperatorKind, OperatorRegistry};
pub use trace::{CalculationStep, ComputationTrace, StepInputs};
pub use types::{FeatureSnapshot, FeatureValue, RiskLevel, Rule, RuleChain, Verdict};
