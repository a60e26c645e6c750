use chrono::{DateTime, Utc};
use rule_engine::{ComputationTrace, FeatureSnapshot, Rule};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ===== Evaluation Request =====
#[derive(Debug, Deserialize, Clone)]
pub struct EvaluateRequest {
    pub features: FeatureSnapshot,
    pub rules: Vec<Rule>,
    /// Request a prose explanation alongside the trace
    #[serde(default)]
    pub explain: bool,
}

// ===== Evaluation Response =====
#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub request_id: Uuid,
    pub risk_indicator: u8,
    pub risk_level: String,
    pub feature_count: usize,
    pub step_count: usize,
    pub trace: ComputationTrace,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation_error: Option<String>,
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluateResponse {
    pub fn from_trace(
        trace: ComputationTrace,
        explanation: Option<String>,
        explanation_error: Option<String>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            risk_indicator: trace.final_verdict.as_u8(),
            risk_level: trace.risk_level().as_str().to_string(),
            feature_count: trace.features.len(),
            step_count: trace.steps.len(),
            trace,
            explanation,
            explanation_error,
            evaluated_at: Utc::now(),
        }
    }
}

// ===== Health Check =====
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
