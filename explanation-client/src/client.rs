//! Retrying HTTP client for the chat-completions collaborator

use crate::error::{ExplanationError, Result};
use crate::prompt::{build_prompt, SYSTEM_PROMPT};
use rule_engine::{ComputationTrace, FeatureSnapshot};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

/// Explainer configuration
#[derive(Debug, Clone)]
pub struct ExplainerConfig {
    /// Chat-completions endpoint URL
    pub endpoint: String,

    /// Model identifier to request
    pub model: String,

    /// Bearer token, if the endpoint requires one
    pub api_key: Option<String>,

    /// Max attempts before giving up
    pub max_attempts: u32,

    /// Initial retry delay
    pub initial_backoff: Duration,

    /// Max retry delay
    pub max_backoff: Duration,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for ExplainerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9997/v1/chat/completions".to_string(),
            model: "qwen3".to_string(),
            api_key: None,
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Client for the explanation collaborator
pub struct ExplanationClient {
    http: reqwest::Client,
    config: ExplainerConfig,
}

impl ExplanationClient {
    /// Create a client from the given configuration
    pub fn new(config: ExplainerConfig) -> Result<Self> {
        if config.max_attempts == 0 {
            return Err(ExplanationError::InvalidConfig(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ExplanationError::InvalidConfig(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Request a natural-language explanation for a computed trace
    ///
    /// Retries transient failures with exponential backoff; a trace that was
    /// already computed is unaffected by a failure here.
    pub async fn explain(
        &self,
        snapshot: &FeatureSnapshot,
        trace: &ComputationTrace,
    ) -> Result<String> {
        let prompt = build_prompt(snapshot, trace);
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                },
            ],
        };

        let mut attempts = 0;
        let mut delay = self.config.initial_backoff;
        loop {
            attempts += 1;

            match self.request_once(&body).await {
                Ok(content) => {
                    if attempts > 1 {
                        info!("Explanation obtained after {} attempts", attempts);
                    }
                    return Ok(content);
                }
                Err(RequestFailure::Fatal(err)) => return Err(err),
                Err(RequestFailure::Transient(detail)) => {
                    if attempts >= self.config.max_attempts {
                        error!(
                            "Explanation request failed after {} attempts: {}",
                            attempts, detail
                        );
                        return Err(ExplanationError::Unreachable { attempts, detail });
                    }
                    warn!(
                        "Explanation request failed (attempt {}), retrying in {:?}: {}",
                        attempts, delay, detail
                    );
                    tokio::time::sleep(delay).await;

                    // Exponential backoff
                    delay = (delay * 2).min(self.config.max_backoff);
                }
            }
        }
    }

    async fn request_once(&self, body: &ChatRequest<'_>) -> std::result::Result<String, RequestFailure> {
        let mut request = self.http.post(&self.config.endpoint).json(body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RequestFailure::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RequestFailure::Transient(format!(
                "status {}: {}",
                status, body
            )));
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|e| RequestFailure::Fatal(ExplanationError::MalformedResponse(e.to_string())))?;

        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| {
                RequestFailure::Fatal(ExplanationError::MalformedResponse(
                    "response contained no choices".to_string(),
                ))
            })
    }
}

enum RequestFailure {
    /// Worth retrying: transport error or non-2xx status
    Transient(String),
    /// Not worth retrying: the endpoint answered but the payload is unusable
    Fatal(ExplanationError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_attempts_is_invalid() {
        let config = ExplainerConfig {
            max_attempts: 0,
            ..ExplainerConfig::default()
        };
        assert!(matches!(
            ExplanationClient::new(config),
            Err(ExplanationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn default_config_builds_a_client() {
        assert!(ExplanationClient::new(ExplainerConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn unreachable_endpoint_exhausts_retries() {
        let config = ExplainerConfig {
            // Nothing listens on this port
            endpoint: "http://127.0.0.1:1/v1/chat/completions".to_string(),
            max_attempts: 2,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            request_timeout: Duration::from_millis(250),
            ..ExplainerConfig::default()
        };
        let client = ExplanationClient::new(config).unwrap();

        let mut snapshot = FeatureSnapshot::new();
        snapshot.insert("a", 2.0);
        snapshot.insert("b", 1.0);
        let chain = rule_engine::RuleChain::new(vec![
            rule_engine::Rule::attribute("compare", vec!["a".into(), "b".into()], None),
            rule_engine::Rule::attribute("compare", vec!["b".into(), "a".into()], None),
            rule_engine::Rule::combinator("or"),
        ]);
        let trace = rule_engine::Evaluator::with_standard_operators()
            .evaluate(&snapshot, &chain)
            .unwrap();

        match client.explain(&snapshot, &trace).await {
            Err(ExplanationError::Unreachable { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("expected Unreachable, got {:?}", other.map(|_| ())),
        }
    }
}
