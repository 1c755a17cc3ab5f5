use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::models::{progress::EligibilityReport, Level};

/// Error taxonomy for the progression engine. Validation and not-found map
/// to caller mistakes; the pool and progression variants carry enough
/// context for the client to explain the rejection to the learner.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("insufficient question pool for level {level}: {available} of {required} questions available")]
    InsufficientQuestionPool {
        level: Level,
        available: u64,
        required: usize,
    },

    #[error("invalid level progression from {from} to {to}")]
    InvalidProgression { from: Level, to: Level },

    #[error("level requirements not met for {}", .report.current_level)]
    RequirementsNotMet { report: EligibilityReport },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError::NotFound(what.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InsufficientQuestionPool { .. } => StatusCode::CONFLICT,
            ApiError::InvalidProgression { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RequirementsNotMet { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            // Ineligibility always ships the completion breakdown so the
            // caller can show the learner what is still missing.
            ApiError::RequirementsNotMet { report } => json!({
                "error": self.to_string(),
                "eligibility": report,
            }),
            ApiError::Internal(err) => {
                tracing::error!("internal error: {:#}", err);
                json!({ "error": "internal server error" })
            }
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
