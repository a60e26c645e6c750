//! HTTP shell around the rule engine
//!
//! Decodes evaluation requests into a feature snapshot and rule chain,
//! runs the engine, optionally asks the explanation collaborator for a
//! prose explanation, and serializes the trace plus a short summary.

pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;

// Re-exports for convenience
pub use config::Config;
pub use handlers::AppState;
