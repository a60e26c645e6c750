//! Error types for the rule engine

use thiserror::Error;

/// Evaluation error
///
/// All variants are fatal for the evaluation that raised them: the engine
/// never retries internally and never returns a partial trace.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluationError {
    /// Operator identifier not present in the registry
    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    /// Rule feature count or combinator input count does not match the
    /// operator's declared shape
    #[error("Arity mismatch for operator {operator}: {detail}")]
    ArityMismatch {
        /// Offending operator identifier
        operator: String,
        /// What was expected versus what the rule supplied
        detail: String,
    },

    /// A named feature is absent from the snapshot
    #[error("Missing feature: {0}")]
    MissingFeature(String),

    /// Zero denominator in a ratio-family operator
    #[error("Division by zero in operator {0}")]
    DivisionByZero(String),

    /// Wrong-kind or wrong-dimension input to a fixed-shape operator
    #[error("Malformed vector input for operator {operator}: {detail}")]
    MalformedVector {
        /// Offending operator identifier
        operator: String,
        /// Which input was malformed and why
        detail: String,
    },

    /// Chain is too short, terminal rule is not a combinator, or the
    /// combinator arity does not match the attribute-rule count
    #[error("Unsupported chain shape: {0}")]
    UnsupportedChainShape(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, EvaluationError>;
