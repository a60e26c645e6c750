use crate::errors::ApiError;
use crate::models::{EvaluateRequest, EvaluateResponse, HealthResponse};
use actix_web::{web, HttpResponse};
use explanation_client::ExplanationClient;
use rule_engine::{Evaluator, RuleChain};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// Shared, read-only application state
///
/// The evaluator holds the immutable operator registry, so one instance is
/// safely shared across all workers without locking.
pub struct AppState {
    pub evaluator: Evaluator,
    pub explainer: Option<ExplanationClient>,
}

// ===== Health Check =====
pub async fn health_check() -> HttpResponse {
    let uptime = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime,
    })
}

// ===== Evaluate Risk =====
pub async fn evaluate_risk(
    req: web::Json<EvaluateRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let request = req.into_inner();

    if request.features.is_empty() {
        return Err(ApiError::Validation("features must not be empty".to_string()));
    }
    if request.rules.is_empty() {
        return Err(ApiError::Validation("rules must not be empty".to_string()));
    }

    let chain = RuleChain::new(request.rules);
    let trace = state.evaluator.evaluate(&request.features, &chain)?;
    info!(
        indicator = trace.final_verdict.as_u8(),
        steps = trace.steps.len(),
        "evaluation complete"
    );

    // A connectivity failure here never invalidates the computed trace;
    // it is reported alongside it instead.
    let (explanation, explanation_error) = if request.explain {
        match &state.explainer {
            Some(client) => match client.explain(&request.features, &trace).await {
                Ok(text) => (Some(text), None),
                Err(e) => {
                    warn!("Explanation collaborator failed: {}", e);
                    (None, Some(e.to_string()))
                }
            },
            None => (
                None,
                Some("explanation collaborator is not configured".to_string()),
            ),
        }
    } else {
        (None, None)
    };

    Ok(HttpResponse::Ok().json(EvaluateResponse::from_trace(
        trace,
        explanation,
        explanation_error,
    )))
}

// ===== Configure Routes =====
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/risk").route("/evaluate", web::post().to(evaluate_risk)),
    )
    .route("/health", web::get().to(health_check));
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    fn test_state() -> web::Data<AppState> {
        web::Data::new(AppState {
            evaluator: Evaluator::with_standard_operators(),
            explainer: None,
        })
    }

    #[actix_web::test]
    async fn health_endpoint_reports_healthy() {
        let app = test::init_service(
            App::new().app_data(test_state()).configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "healthy");
    }

    #[actix_web::test]
    async fn evaluate_returns_trace_and_summary() {
        let app = test::init_service(
            App::new().app_data(test_state()).configure(configure_routes),
        )
        .await;

        let payload = serde_json::json!({
            "features": {"申报重量": 55, "限重": 50, "申报价格": 100, "参考价格": 80},
            "rules": [
                {"operator": "difference", "features": ["申报重量", "限重"], "threshold": 0},
                {"operator": "ratio", "features": ["申报价格", "参考价格"], "threshold": 1.2},
                {"operator": "and"}
            ]
        });

        let req = test::TestRequest::post()
            .uri("/api/v1/risk/evaluate")
            .set_json(&payload)
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["risk_indicator"], 1);
        assert_eq!(body["risk_level"], "HIGH");
        assert_eq!(body["feature_count"], 4);
        assert_eq!(body["step_count"], 3);
        assert_eq!(body["trace"]["intermediate_verdicts"], serde_json::json!([1, 1]));
        assert!(body.get("explanation").is_none());
    }

    #[actix_web::test]
    async fn unknown_operator_maps_to_bad_request() {
        let app = test::init_service(
            App::new().app_data(test_state()).configure(configure_routes),
        )
        .await;

        let payload = serde_json::json!({
            "features": {"a": 1, "b": 2},
            "rules": [
                {"operator": "no_such_operator", "features": ["a", "b"], "threshold": 0},
                {"operator": "compare", "features": ["a", "b"]},
                {"operator": "and"}
            ]
        });

        let req = test::TestRequest::post()
            .uri("/api/v1/risk/evaluate")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "EVALUATION_ERROR");
    }

    #[actix_web::test]
    async fn empty_rules_are_rejected() {
        let app = test::init_service(
            App::new().app_data(test_state()).configure(configure_routes),
        )
        .await;

        let payload = serde_json::json!({
            "features": {"a": 1},
            "rules": []
        });

        let req = test::TestRequest::post()
            .uri("/api/v1/risk/evaluate")
            .set_json(&payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);

        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[actix_web::test]
    async fn explain_without_collaborator_reports_error_field() {
        let app = test::init_service(
            App::new().app_data(test_state()).configure(configure_routes),
        )
        .await;

        let payload = serde_json::json!({
            "features": {"a": 2, "b": 1},
            "rules": [
                {"operator": "compare", "features": ["a", "b"]},
                {"operator": "compare", "features": ["b", "a"]},
                {"operator": "or"}
            ],
            "explain": true
        });

        let req = test::TestRequest::post()
            .uri("/api/v1/risk/evaluate")
            .set_json(&payload)
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        // The trace is still returned even though no explainer is configured
        assert_eq!(body["risk_indicator"], 1);
        assert!(body["explanation_error"].is_string());
    }
}
