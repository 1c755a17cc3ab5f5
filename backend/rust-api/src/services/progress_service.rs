use crate::error::ApiError;
use crate::metrics::{track_db_operation, LESSONS_COMPLETED_TOTAL};
use crate::models::progress::{
    CompleteLessonRequest, CompleteLessonResponse, LessonCompletion, ProgressState,
};
use crate::models::ModuleType;
use anyhow::Context;
use chrono::{NaiveDate, Utc};
use mongodb::bson::{doc, to_document};
use mongodb::{Collection, Database};
use std::str::FromStr;

use super::achievement_service::AchievementService;

pub struct ProgressService {
    mongo: Database,
}

impl ProgressService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn completions(&self) -> Collection<LessonCompletion> {
        self.mongo.collection("lesson_completions")
    }

    fn states(&self) -> Collection<ProgressState> {
        self.mongo.collection("progress_states")
    }

    /// Record a lesson completion. Repeat completions of the same lesson are
    /// success no-ops; counters and streak move only on a fresh insert.
    pub async fn complete_lesson(
        &self,
        user_id: &str,
        req: &CompleteLessonRequest,
    ) -> Result<CompleteLessonResponse, ApiError> {
        if user_id.trim().is_empty() {
            return Err(ApiError::validation("user_id must not be empty"));
        }
        let module = ModuleType::from_str(&req.module).map_err(ApiError::Validation)?;

        let storage_id = LessonCompletion::storage_id(user_id, module, &req.lesson_id);
        let completion = LessonCompletion {
            id: storage_id.clone(),
            user_id: user_id.to_string(),
            module,
            lesson_id: req.lesson_id.clone(),
            completed_at: Utc::now(),
            score: req.score,
            time_spent_seconds: req.time_spent_seconds,
        };

        let mut on_insert =
            to_document(&completion).context("Failed to serialize lesson completion")?;
        on_insert.remove("_id");

        let completions = self.completions();
        let update = track_db_operation("upsert", "lesson_completions", async {
            completions
                .update_one(
                    doc! { "_id": &storage_id },
                    doc! { "$setOnInsert": on_insert },
                )
                .upsert(true)
                .await
                .context("Failed to record lesson completion")
        })
        .await?;

        let newly_recorded = update.upserted_id.is_some();
        let mut state = self.get_or_create_state(user_id).await?;

        if newly_recorded {
            let first_ever = state.lessons_completed == 0;

            state.lessons_completed += 1;
            if module == ModuleType::Vocabulary {
                state.vocabulary_count += 1;
            }
            roll_streak(&mut state, Utc::now().date_naive());
            state.updated_at = Utc::now();
            self.store_state(&state).await?;

            LESSONS_COMPLETED_TOTAL
                .with_label_values(&[module.as_str()])
                .inc();

            if first_ever {
                AchievementService::new(self.mongo.clone())
                    .award(
                        user_id,
                        "first_lesson",
                        "First steps",
                        "Completed the very first lesson",
                        None,
                    )
                    .await?;
            }

            tracing::info!(
                "Lesson completed: user={}, module={}, lesson={}",
                user_id,
                module,
                req.lesson_id
            );
        } else {
            tracing::info!(
                "Duplicate lesson completion ignored: user={}, module={}, lesson={}",
                user_id,
                module,
                req.lesson_id
            );
        }

        Ok(CompleteLessonResponse {
            already_completed: !newly_recorded,
            lessons_completed: state.lessons_completed,
            vocabulary_count: state.vocabulary_count,
            current_streak_days: state.current_streak_days,
        })
    }

    /// Stored progress for a learner; 404 when the learner has never touched
    /// the system.
    pub async fn get_state(&self, user_id: &str) -> Result<ProgressState, ApiError> {
        self.states()
            .find_one(doc! { "_id": user_id })
            .await
            .context("Failed to load progress state")?
            .ok_or_else(|| ApiError::not_found(format!("learner {}", user_id)))
    }

    /// Stored progress, creating the floor-level row on first touch.
    pub async fn get_or_create_state(&self, user_id: &str) -> Result<ProgressState, ApiError> {
        if let Some(state) = self
            .states()
            .find_one(doc! { "_id": user_id })
            .await
            .context("Failed to load progress state")?
        {
            return Ok(state);
        }

        let fresh = ProgressState::new(user_id);
        let mut on_insert = to_document(&fresh).context("Failed to serialize progress state")?;
        on_insert.remove("_id");

        // $setOnInsert keeps a concurrent first touch from clobbering state.
        self.states()
            .update_one(doc! { "_id": user_id }, doc! { "$setOnInsert": on_insert })
            .upsert(true)
            .await
            .context("Failed to create progress state")?;

        self.states()
            .find_one(doc! { "_id": user_id })
            .await
            .context("Failed to reload progress state")?
            .ok_or_else(|| {
                ApiError::Internal(anyhow::anyhow!("progress state for {} missing after upsert", user_id))
            })
    }

    /// Commit a level change. The level upgrade service is the only caller.
    pub async fn set_level(&self, user_id: &str, level: crate::models::Level) -> Result<(), ApiError> {
        let mut state = self.get_or_create_state(user_id).await?;
        state.current_level = level;
        state.updated_at = Utc::now();
        self.store_state(&state).await
    }

    async fn store_state(&self, state: &ProgressState) -> Result<(), ApiError> {
        self.states()
            .replace_one(doc! { "_id": &state.user_id }, state)
            .upsert(true)
            .await
            .context("Failed to store progress state")?;
        Ok(())
    }
}

/// Roll the daily activity streak: same day keeps it, the next calendar day
/// extends it, any gap resets to 1.
fn roll_streak(state: &mut ProgressState, today: NaiveDate) {
    match state.last_activity_date {
        Some(last) if last == today => {}
        Some(last) if last.succ_opt() == Some(today) => {
            state.current_streak_days += 1;
        }
        _ => {
            state.current_streak_days = 1;
        }
    }
    state.longest_streak_days = state.longest_streak_days.max(state.current_streak_days);
    state.last_activity_date = Some(today);
}
