//! Client for the external risk-explanation collaborator
//!
//! Takes a computed trace and asks an OpenAI-style chat-completions endpoint
//! for a free-text explanation of the verdict. The call crosses a network
//! boundary and is retried a bounded number of times with exponential
//! backoff; exhausting retries surfaces a connectivity error distinct from
//! the engine's evaluation errors, and the already-computed trace stays
//! valid either way.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod prompt;

pub use client::{ExplainerConfig, ExplanationClient};
pub use error::ExplanationError;
pub use prompt::build_prompt;
