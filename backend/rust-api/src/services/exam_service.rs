use crate::error::ApiError;
use crate::metrics::{
    record_cache_hit, record_cache_miss, track_cache_operation, track_db_operation,
    EXAMS_GENERATED_TOTAL, EXAM_SUBMISSIONS_TOTAL,
};
use crate::models::exam::{
    AttemptSummary, CategoryStat, ExamAttempt, GradedAnswer, SubmitExamRequest, SubmitExamResponse,
    SubmittedAnswer, EXAM_QUESTION_COUNT, PASSING_SCORE,
};
use crate::models::question::{ExamQuestion, GenerateExamResponse, Question};
use crate::models::Level;
use anyhow::Context;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Collection, Database};
use rand::seq::SliceRandom;
use redis::aio::ConnectionManager;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;
use uuid::Uuid;

pub struct ExamService {
    mongo: Database,
    redis: ConnectionManager,
}

impl ExamService {
    pub fn new(mongo: Database, redis: ConnectionManager) -> Self {
        Self { mongo, redis }
    }

    fn questions(&self) -> Collection<Question> {
        self.mongo.collection("questions")
    }

    fn attempts(&self) -> Collection<ExamAttempt> {
        self.mongo.collection("exam_attempts")
    }

    /// Sample a fresh exam for the level. Random per call; read-only.
    pub async fn generate(&self, level: &str) -> Result<GenerateExamResponse, ApiError> {
        let level = Level::from_str(level).map_err(ApiError::Validation)?;

        let cursor = self
            .questions()
            .find(doc! { "level": level.as_str() })
            .await
            .context("Failed to query question bank")?;
        let mut pool: Vec<Question> = cursor
            .try_collect()
            .await
            .context("Failed to collect questions")?;

        if pool.len() < EXAM_QUESTION_COUNT {
            return Err(ApiError::InsufficientQuestionPool {
                level,
                available: pool.len() as u64,
                required: EXAM_QUESTION_COUNT,
            });
        }

        let mut rng = rand::rng();
        pool.shuffle(&mut rng);
        pool.truncate(EXAM_QUESTION_COUNT);

        EXAMS_GENERATED_TOTAL
            .with_label_values(&[level.as_str()])
            .inc();

        tracing::info!("Generated {} exam with {} questions", level, pool.len());

        Ok(GenerateExamResponse {
            level,
            questions: pool.into_iter().map(ExamQuestion::from).collect(),
        })
    }

    /// Grade a submission and persist one immutable attempt record.
    pub async fn submit(&self, req: &SubmitExamRequest) -> Result<SubmitExamResponse, ApiError> {
        let level = Level::from_str(&req.level).map_err(ApiError::Validation)?;

        if req.user_id.trim().is_empty() {
            return Err(ApiError::validation("user_id must not be empty"));
        }
        if req.answers.len() != EXAM_QUESTION_COUNT {
            return Err(ApiError::validation(format!(
                "an exam submission must contain exactly {} answers, got {}",
                EXAM_QUESTION_COUNT,
                req.answers.len()
            )));
        }

        // Replay of an already-graded submission returns the original result.
        if let Some(key) = &req.idempotency_key {
            if let Some(cached) = self.check_idempotency(key).await? {
                record_cache_hit();
                tracing::info!("Returning cached grading result for idempotency_key={}", key);
                return Ok(cached);
            }
            record_cache_miss();
        }

        let ids: Vec<String> = req.answers.iter().map(|a| a.question_id.clone()).collect();
        let cursor = self
            .questions()
            .find(doc! { "_id": { "$in": ids }, "level": level.as_str() })
            .await
            .context("Failed to look up submitted questions")?;
        let bank: HashMap<String, Question> = cursor
            .try_collect::<Vec<_>>()
            .await
            .context("Failed to collect submitted questions")?
            .into_iter()
            .map(|q| (q.id.clone(), q))
            .collect();

        let graded = grade_answers(&bank, &req.answers);

        // Unresolvable ids are dropped from the tally; a record with no
        // graded answers at all fails the record-validity constraint.
        if graded.is_empty() {
            return Err(ApiError::validation(
                "attempt cannot be recorded: none of the submitted question ids exist in the question bank",
            ));
        }

        let correct_count = graded.iter().filter(|g| g.correct).count() as u32;
        let score = score_for(correct_count);
        let passed = score >= PASSING_SCORE;
        let category_breakdown = category_breakdown(&graded);

        let attempt = ExamAttempt {
            id: Uuid::new_v4().to_string(),
            user_id: req.user_id.clone(),
            level,
            score,
            passed,
            correct_count,
            total: EXAM_QUESTION_COUNT as u32,
            submitted_at: Utc::now(),
            time_spent_seconds: req.time_spent_seconds,
            answers: graded.clone(),
        };

        let attempts = self.attempts();
        track_db_operation("insert", "exam_attempts", async {
            attempts
                .insert_one(&attempt)
                .await
                .map(|_| ())
                .context("Failed to persist exam attempt")
        })
        .await?;

        EXAM_SUBMISSIONS_TOTAL
            .with_label_values(&[level.as_str(), if passed { "true" } else { "false" }])
            .inc();

        tracing::info!(
            "Exam graded: user={}, level={}, score={}, correct={}/{}, passed={}",
            req.user_id,
            level,
            score,
            correct_count,
            EXAM_QUESTION_COUNT,
            passed
        );

        let response = SubmitExamResponse {
            attempt_id: attempt.id.clone(),
            level,
            score,
            correct_count,
            total: attempt.total,
            passed,
            category_breakdown,
            answers: graded,
            time_spent_seconds: req.time_spent_seconds,
        };

        // Attempt is already persisted; a failed cache write only loses
        // replay protection for this key.
        if let Some(key) = &req.idempotency_key {
            if let Err(e) = self.cache_response(key, &response).await {
                tracing::warn!("Failed to cache grading result for key {}: {:#}", key, e);
            }
        }

        Ok(response)
    }

    pub async fn get_attempt(&self, attempt_id: &str) -> Result<ExamAttempt, ApiError> {
        self.attempts()
            .find_one(doc! { "_id": attempt_id })
            .await
            .context("Failed to query exam attempts")?
            .ok_or_else(|| ApiError::not_found(format!("exam attempt {}", attempt_id)))
    }

    /// Attempt history for a learner, newest first.
    pub async fn list_attempts(&self, user_id: &str) -> Result<Vec<AttemptSummary>, ApiError> {
        let cursor = self
            .attempts()
            .find(doc! { "user_id": user_id })
            .await
            .context("Failed to query exam attempts")?;
        let mut attempts: Vec<ExamAttempt> = cursor
            .try_collect()
            .await
            .context("Failed to collect exam attempts")?;

        attempts.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

        Ok(attempts.into_iter().map(AttemptSummary::from).collect())
    }

    // Check if this submission was already graded (idempotency)
    async fn check_idempotency(
        &self,
        idempotency_key: &str,
    ) -> Result<Option<SubmitExamResponse>, ApiError> {
        let mut conn = self.redis.clone();
        let cache_key = format!("idempotency:exam:{}", idempotency_key);

        let cached: Option<String> = track_cache_operation("get", async {
            redis::cmd("GET")
                .arg(&cache_key)
                .query_async(&mut conn)
                .await
                .context("Failed to check idempotency cache")
        })
        .await?;

        if let Some(json) = cached {
            let response: SubmitExamResponse =
                serde_json::from_str(&json).context("Failed to deserialize cached response")?;
            return Ok(Some(response));
        }

        Ok(None)
    }

    // Cache grading result for idempotency (24 hour TTL)
    async fn cache_response(
        &self,
        idempotency_key: &str,
        response: &SubmitExamResponse,
    ) -> anyhow::Result<()> {
        let mut conn = self.redis.clone();
        let cache_key = format!("idempotency:exam:{}", idempotency_key);
        let json = serde_json::to_string(response).context("Failed to serialize response")?;

        track_cache_operation("setex", async {
            redis::cmd("SETEX")
                .arg(&cache_key)
                .arg(86400) // 24 hours
                .arg(&json)
                .query_async::<()>(&mut conn)
                .await
                .context("Failed to cache grading result")
        })
        .await?;

        Ok(())
    }
}

/// Resolve each submitted answer against the bank. Answers whose question id
/// is not in the bank are dropped rather than failing the whole submission.
fn grade_answers(bank: &HashMap<String, Question>, answers: &[SubmittedAnswer]) -> Vec<GradedAnswer> {
    answers
        .iter()
        .filter_map(|answer| {
            let question = bank.get(&answer.question_id)?;
            Some(GradedAnswer {
                question_id: question.id.clone(),
                category: question.category.clone(),
                selected_index: answer.selected_index,
                correct_index: question.correct_index,
                correct: answer.selected_index == question.correct_index,
            })
        })
        .collect()
}

/// Score is always out of the full exam size, round-half-up.
fn score_for(correct_count: u32) -> i32 {
    ((correct_count * 100) as f64 / EXAM_QUESTION_COUNT as f64).round() as i32
}

fn category_breakdown(graded: &[GradedAnswer]) -> BTreeMap<String, CategoryStat> {
    let mut breakdown: BTreeMap<String, CategoryStat> = BTreeMap::new();
    for answer in graded {
        let stat = breakdown
            .entry(answer.category.clone())
            .or_insert(CategoryStat {
                total: 0,
                correct: 0,
            });
        stat.total += 1;
        if answer.correct {
            stat.correct += 1;
        }
    }
    breakdown
}
