use actix_web::{HttpResponse, ResponseError};
use rule_engine::EvaluationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Evaluation(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "EVALUATION_ERROR",
                "message": self.to_string()
            })),
            ApiError::Validation(_) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "VALIDATION_ERROR",
                "message": self.to_string()
            })),
            ApiError::Internal(_) => HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "INTERNAL_ERROR",
                "message": self.to_string()
            })),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
