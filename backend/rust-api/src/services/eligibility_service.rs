use crate::error::ApiError;
use crate::models::exam::PASSING_SCORE;
use crate::models::progress::{EligibilityReport, ModuleCompletion, ProgressState};
use crate::models::{Level, ModuleType};
use anyhow::Context;
use mongodb::bson::doc;
use mongodb::{Collection, Database};
use std::collections::BTreeMap;

/// Lesson counts a learner must reach per module to leave a level. The
/// grammar count includes the final exam as one slot.
#[derive(Debug, Clone, Copy)]
pub struct ModuleRequirements {
    pub grammar: u32,
    pub reading: u32,
    pub writing: u32,
    pub vocabulary: u32,
}

impl ModuleRequirements {
    pub fn get(&self, module: ModuleType) -> u32 {
        match module {
            ModuleType::Grammar => self.grammar,
            ModuleType::Reading => self.reading,
            ModuleType::Writing => self.writing,
            ModuleType::Vocabulary => self.vocabulary,
        }
    }

    pub fn total(&self) -> u32 {
        ModuleType::ALL.iter().map(|m| self.get(*m)).sum()
    }
}

/// Requirement table per level; `None` for the top level, which has nothing
/// above it to qualify for.
pub fn requirements_for(level: Level) -> Option<ModuleRequirements> {
    match level {
        Level::A1 => Some(ModuleRequirements {
            grammar: 15,
            reading: 10,
            writing: 3,
            vocabulary: 4,
        }),
        Level::A2 => Some(ModuleRequirements {
            grammar: 18,
            reading: 12,
            writing: 4,
            vocabulary: 5,
        }),
        Level::B1 => Some(ModuleRequirements {
            grammar: 20,
            reading: 14,
            writing: 5,
            vocabulary: 6,
        }),
        Level::B2 => Some(ModuleRequirements {
            grammar: 22,
            reading: 16,
            writing: 6,
            vocabulary: 8,
        }),
        Level::C1 => None,
    }
}

pub struct EligibilityService {
    mongo: Database,
}

impl EligibilityService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Compute the eligibility report for a learner. Pure read: nothing is
    /// cached or persisted, per the recompute-on-demand contract.
    pub async fn check(
        &self,
        user_id: &str,
        requested_level: Option<Level>,
    ) -> Result<EligibilityReport, ApiError> {
        if user_id.trim().is_empty() {
            return Err(ApiError::validation("user_id must not be empty"));
        }

        let states: Collection<ProgressState> = self.mongo.collection("progress_states");
        let current_level = states
            .find_one(doc! { "_id": user_id })
            .await
            .context("Failed to load progress state")?
            .map(|s| s.current_level)
            .unwrap_or(Level::A1);

        let level = requested_level.unwrap_or(current_level);

        let Some(requirements) = requirements_for(level) else {
            // Top of the ladder: no further level exists.
            return Ok(EligibilityReport {
                user_id: user_id.to_string(),
                current_level,
                next_level: None,
                eligible: false,
                modules: BTreeMap::new(),
                overall_percentage: 100.0,
            });
        };

        let mut completed = [(ModuleType::Grammar, 0u32); 4];
        for (slot, module) in completed.iter_mut().zip(ModuleType::ALL) {
            let mut count = self.lesson_count(user_id, module, level).await?;
            // A passed exam occupies the final grammar slot.
            if module == ModuleType::Grammar && self.has_passed_exam(user_id, level).await? {
                count += 1;
            }
            *slot = (module, count);
        }

        Ok(build_report(
            user_id,
            current_level,
            level,
            &completed,
            &requirements,
        ))
    }

    /// Distinct completed lessons for a module carrying the level's prefix.
    /// Distinctness is guaranteed by the completion record's primary key.
    async fn lesson_count(
        &self,
        user_id: &str,
        module: ModuleType,
        level: Level,
    ) -> Result<u32, ApiError> {
        let completions = self
            .mongo
            .collection::<mongodb::bson::Document>("lesson_completions");
        let count = completions
            .count_documents(doc! {
                "user_id": user_id,
                "module": module.as_str(),
                "lesson_id": { "$regex": format!("^{}", level.lesson_prefix()) },
            })
            .await
            .context("Failed to count lesson completions")?;
        Ok(count as u32)
    }

    async fn has_passed_exam(&self, user_id: &str, level: Level) -> Result<bool, ApiError> {
        let attempts = self
            .mongo
            .collection::<mongodb::bson::Document>("exam_attempts");
        let count = attempts
            .count_documents(doc! {
                "user_id": user_id,
                "level": level.as_str(),
                "score": { "$gte": PASSING_SCORE },
            })
            .await
            .context("Failed to count passing exam attempts")?;
        Ok(count > 0)
    }
}

/// Assemble the report from raw per-module counts. Per-module contribution
/// to the percentage is capped at the required amount.
fn build_report(
    user_id: &str,
    current_level: Level,
    level: Level,
    completed: &[(ModuleType, u32); 4],
    requirements: &ModuleRequirements,
) -> EligibilityReport {
    let mut modules = BTreeMap::new();
    let mut capped_sum = 0u32;

    for (module, count) in completed {
        let required = requirements.get(*module);
        capped_sum += (*count).min(required);
        modules.insert(
            module.as_str().to_string(),
            ModuleCompletion {
                completed: *count,
                required,
                complete: *count >= required,
            },
        );
    }

    let eligible = modules.values().all(|m| m.complete);
    let overall_percentage = round1(capped_sum as f64 / requirements.total() as f64 * 100.0);

    EligibilityReport {
        user_id: user_id.to_string(),
        current_level,
        next_level: level.next(),
        eligible,
        modules,
        overall_percentage,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
