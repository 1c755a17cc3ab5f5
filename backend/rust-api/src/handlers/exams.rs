use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::ApiError,
    extractors::AppJson,
    models::{exam::SubmitExamRequest, question::GenerateExamRequest},
    services::{exam_service::ExamService, AppState},
};

/// POST /api/v1/exams/generate - sample a fresh exam for a level
pub async fn generate_exam(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<GenerateExamRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Generating exam for level={}", req.level);

    let service = ExamService::new(state.mongo.clone(), state.redis.clone());
    let response = service.generate(&req.level).await?;

    Ok((StatusCode::OK, Json(response)))
}

/// POST /api/v1/exams/submit - grade a 35-answer submission
pub async fn submit_exam(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<SubmitExamRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    tracing::info!(
        "Grading exam submission: user={}, level={}, answers={}",
        req.user_id,
        req.level,
        req.answers.len()
    );

    let service = ExamService::new(state.mongo.clone(), state.redis.clone());
    let response = service.submit(&req).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/exams/attempts/{id} - one attempt record
pub async fn get_attempt(
    State(state): State<Arc<AppState>>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ExamService::new(state.mongo.clone(), state.redis.clone());
    let attempt = service.get_attempt(&attempt_id).await?;

    Ok((StatusCode::OK, Json(attempt)))
}

/// GET /api/v1/exams/learners/{user_id}/attempts - attempt history
pub async fn list_attempts(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ExamService::new(state.mongo.clone(), state.redis.clone());
    let attempts = service.list_attempts(&user_id).await?;

    Ok((StatusCode::OK, Json(attempts)))
}
