use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::str::FromStr;
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::ApiError,
    extractors::AppJson,
    models::{
        achievement::AchievementSummary,
        progress::{CompleteLessonRequest, EligibilityQuery, UpgradeRequest},
        Level,
    },
    services::{
        achievement_service::AchievementService, eligibility_service::EligibilityService,
        level_service::LevelService, progress_service::ProgressService, AppState,
    },
};

/// GET /api/v1/progress/{user_id} - stored progress state
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ProgressService::new(state.mongo.clone());
    let progress = service.get_state(&user_id).await?;

    Ok((StatusCode::OK, Json(progress)))
}

/// POST /api/v1/progress/{user_id}/lessons - record a lesson completion
pub async fn complete_lesson(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    AppJson(req): AppJson<CompleteLessonRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    tracing::info!(
        "Recording lesson completion: user={}, module={}, lesson={}",
        user_id,
        req.module,
        req.lesson_id
    );

    let service = ProgressService::new(state.mongo.clone());
    let response = service.complete_lesson(&user_id, &req).await?;

    let status = if response.already_completed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(response)))
}

/// GET /api/v1/progress/{user_id}/eligibility - recompute the report
pub async fn check_eligibility(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<EligibilityQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let level = query
        .level
        .as_deref()
        .map(Level::from_str)
        .transpose()
        .map_err(ApiError::Validation)?;

    let service = EligibilityService::new(state.mongo.clone());
    let report = service.check(&user_id, level).await?;

    Ok((StatusCode::OK, Json(report)))
}

/// POST /api/v1/progress/{user_id}/upgrade - commit a level transition
pub async fn upgrade_level(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    AppJson(req): AppJson<UpgradeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Upgrade requested: user={}, to_level={}", user_id, req.to_level);

    let service = LevelService::new(state.mongo.clone());
    let response = service.upgrade(&user_id, &req.to_level).await?;

    Ok((StatusCode::OK, Json(response)))
}

/// GET /api/v1/progress/{user_id}/achievements - earned badges, newest first
pub async fn list_achievements(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AchievementService::new(state.mongo.clone());
    let achievements = service.list(&user_id).await?;

    let summaries: Vec<AchievementSummary> = achievements
        .into_iter()
        .map(AchievementSummary::from)
        .collect();

    Ok((StatusCode::OK, Json(summaries)))
}
