use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use super::{Level, ModuleType};

/// Completion record for a single lesson. The `_id` encodes the uniqueness
/// constraint: one record per (learner, module, lesson).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonCompletion {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub module: ModuleType,
    pub lesson_id: String,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_seconds: Option<u32>,
}

impl LessonCompletion {
    pub fn storage_id(user_id: &str, module: ModuleType, lesson_id: &str) -> String {
        format!("{}:{}:{}", user_id, module.as_str(), lesson_id)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CompleteLessonRequest {
    pub module: String,

    #[validate(length(min = 1, max = 128, message = "lesson_id must not be empty"))]
    pub lesson_id: String,

    pub score: Option<i32>,
    pub time_spent_seconds: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct CompleteLessonResponse {
    /// True when this (learner, module, lesson) was already recorded; the
    /// duplicate completion is a no-op, not an error.
    pub already_completed: bool,
    pub lessons_completed: u32,
    pub vocabulary_count: u32,
    pub current_streak_days: u32,
}

/// Singleton per-learner progress row (`_id` = user id). The level field is
/// written only by the level upgrade path; counters by lesson recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressState {
    #[serde(rename = "_id")]
    pub user_id: String,
    pub current_level: Level,
    pub lessons_completed: u32,
    pub vocabulary_count: u32,
    pub current_streak_days: u32,
    pub longest_streak_days: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity_date: Option<NaiveDate>,
    pub updated_at: DateTime<Utc>,
}

impl ProgressState {
    /// Fresh learner state at the floor level.
    pub fn new(user_id: &str) -> Self {
        ProgressState {
            user_id: user_id.to_string(),
            current_level: Level::A1,
            lessons_completed: 0,
            vocabulary_count: 0,
            current_streak_days: 0,
            longest_streak_days: 0,
            last_activity_date: None,
            updated_at: Utc::now(),
        }
    }
}

/// Per-module slice of an eligibility report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleCompletion {
    pub completed: u32,
    pub required: u32,
    pub complete: bool,
}

/// Result of an eligibility check. Computed on demand, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EligibilityReport {
    pub user_id: String,
    pub current_level: Level,
    pub next_level: Option<Level>,
    pub eligible: bool,
    pub modules: BTreeMap<String, ModuleCompletion>,
    pub overall_percentage: f64,
}

#[derive(Debug, Deserialize)]
pub struct EligibilityQuery {
    pub level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpgradeRequest {
    pub to_level: String,
}

#[derive(Debug, Serialize)]
pub struct UpgradeResponse {
    pub success: bool,
    pub previous_level: Level,
    pub new_level: Level,
    pub achievement: super::achievement::AchievementSummary,
}
