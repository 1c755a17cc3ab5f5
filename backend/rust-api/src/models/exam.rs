use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::Validate;

use super::Level;

/// Every level exam consists of exactly this many questions.
pub const EXAM_QUESTION_COUNT: usize = 35;

/// Minimum score (0-100) for an attempt to count as passed.
pub const PASSING_SCORE: i32 = 70;

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitExamRequest {
    #[validate(length(min = 1, message = "user_id must not be empty"))]
    pub user_id: String,

    pub level: String,

    #[validate(length(equal = 35, message = "an exam submission must contain exactly 35 answers"))]
    pub answers: Vec<SubmittedAnswer>,

    pub time_spent_seconds: Option<u32>,

    /// Optional client-supplied key; a replayed submission with the same key
    /// returns the original grading result instead of creating a new attempt.
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: String,
    pub selected_index: u32,
}

/// One graded answer embedded in an attempt. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradedAnswer {
    pub question_id: String,
    pub category: String,
    pub selected_index: u32,
    pub correct_index: u32,
    pub correct: bool,
}

/// Attempt record stored in the append-only "exam_attempts" collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamAttempt {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub level: Level,
    pub score: i32,
    pub passed: bool,
    pub correct_count: u32,
    pub total: u32,
    pub submitted_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_seconds: Option<u32>,
    pub answers: Vec<GradedAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryStat {
    pub total: u32,
    pub correct: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitExamResponse {
    pub attempt_id: String,
    pub level: Level,
    pub score: i32,
    pub correct_count: u32,
    pub total: u32,
    pub passed: bool,
    pub category_breakdown: BTreeMap<String, CategoryStat>,
    pub answers: Vec<GradedAnswer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_seconds: Option<u32>,
}

/// Compact attempt view for history listings.
#[derive(Debug, Serialize)]
pub struct AttemptSummary {
    pub attempt_id: String,
    pub level: Level,
    pub score: i32,
    pub passed: bool,
    pub correct_count: u32,
    pub total: u32,
    pub submitted_at: DateTime<Utc>,
}

impl From<ExamAttempt> for AttemptSummary {
    fn from(a: ExamAttempt) -> Self {
        AttemptSummary {
            attempt_id: a.id,
            level: a.level,
            score: a.score,
            passed: a.passed,
            correct_count: a.correct_count,
            total: a.total,
            submitted_at: a.submitted_at,
        }
    }
}
