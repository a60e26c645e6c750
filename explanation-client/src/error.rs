//! Error types for the explanation client

use thiserror::Error;

/// Explanation collaborator error
///
/// None of these overlap with the engine's evaluation errors: a failure here
/// means the collaborator could not be reached or answered nonsense, never
/// that the trace itself is invalid.
#[derive(Debug, Error)]
pub enum ExplanationError {
    /// All retry attempts were exhausted
    #[error("Explanation collaborator unreachable after {attempts} attempts: {detail}")]
    Unreachable {
        /// How many attempts were made
        attempts: u32,
        /// Last transport or status failure observed
        detail: String,
    },

    /// The endpoint answered 2xx but the payload had no usable content
    #[error("Malformed explanation response: {0}")]
    MalformedResponse(String),

    /// Client misconfiguration
    #[error("Invalid explainer configuration: {0}")]
    InvalidConfig(String),
}

/// Result type
pub type Result<T> = std::result::Result<T, ExplanationError>;
