use crate::error::ApiError;
use crate::metrics::LEVEL_UPGRADES_TOTAL;
use crate::models::progress::UpgradeResponse;
use crate::models::Level;
use mongodb::bson::doc;
use mongodb::Database;
use std::str::FromStr;

use super::achievement_service::AchievementService;
use super::eligibility_service::EligibilityService;
use super::progress_service::ProgressService;

/// The only mutation path for a learner's level.
pub struct LevelService {
    mongo: Database,
}

impl LevelService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    /// Validate and commit a level transition. The target must be the
    /// immediate successor of the stored level, and eligibility is
    /// re-verified before anything is written.
    pub async fn upgrade(&self, user_id: &str, to_level: &str) -> Result<UpgradeResponse, ApiError> {
        if user_id.trim().is_empty() {
            return Err(ApiError::validation("user_id must not be empty"));
        }
        let target = Level::from_str(to_level).map_err(ApiError::Validation)?;

        let progress = ProgressService::new(self.mongo.clone());
        let current = progress.get_or_create_state(user_id).await?.current_level;

        if current.next() != Some(target) {
            return Err(ApiError::InvalidProgression {
                from: current,
                to: target,
            });
        }

        let report = EligibilityService::new(self.mongo.clone())
            .check(user_id, Some(current))
            .await?;
        if !report.eligible {
            return Err(ApiError::RequirementsNotMet { report });
        }

        progress.set_level(user_id, target).await?;

        // Idempotent: a replayed upgrade returns the already-earned badge.
        let (achievement, _newly_awarded) = AchievementService::new(self.mongo.clone())
            .award(
                user_id,
                &format!("level_upgrade_{}", target.as_str().to_lowercase()),
                &format!("Level up: {}", target),
                &format!("Advanced from {} to {}", current, target),
                Some(doc! { "from": current.as_str(), "to": target.as_str() }),
            )
            .await?;

        LEVEL_UPGRADES_TOTAL
            .with_label_values(&[target.as_str()])
            .inc();

        tracing::info!(
            "Level upgrade committed: user={}, {} -> {}",
            user_id,
            current,
            target
        );

        Ok(UpgradeResponse {
            success: true,
            previous_level: current,
            new_level: target,
            achievement: achievement.into(),
        })
    }
}
