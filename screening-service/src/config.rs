use config::{ConfigError, Environment};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub explainer: ExplainerSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ExplainerSettings {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    pub max_attempts: u32,
    pub request_timeout_seconds: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            // Server defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8000)?
            .set_default("server.workers", 4)?
            // Explanation collaborator defaults
            .set_default("explainer.enabled", true)?
            .set_default("explainer.endpoint", "http://localhost:9997/v1/chat/completions")?
            .set_default("explainer.model", "qwen3")?
            .set_default("explainer.max_attempts", 3)?
            .set_default("explainer.request_timeout_seconds", 30)?;

        builder = builder.add_source(Environment::with_prefix("SCREENING").separator("__"));

        // Override from environment variables
        if let Ok(port) = env::var("SERVICE_PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        if let Ok(endpoint) = env::var("EXPLAINER_URL") {
            builder = builder.set_override("explainer.endpoint", endpoint)?;
        }

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = Config::from_env().unwrap();
        assert!(config.server.port > 0);
        assert!(config.explainer.max_attempts >= 1);
    }
}
