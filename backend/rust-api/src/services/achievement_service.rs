use crate::error::ApiError;
use crate::metrics::ACHIEVEMENTS_AWARDED_TOTAL;
use crate::models::achievement::Achievement;
use anyhow::Context;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, to_document, Document};
use mongodb::{Collection, Database};

pub struct AchievementService {
    mongo: Database,
}

impl AchievementService {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn collection(&self) -> Collection<Achievement> {
        self.mongo.collection("achievements")
    }

    /// Award an achievement kind to a learner. Awarding the same kind twice
    /// returns the existing record; the boolean reports whether this call
    /// created it.
    pub async fn award(
        &self,
        user_id: &str,
        kind: &str,
        title: &str,
        description: &str,
        metadata: Option<Document>,
    ) -> Result<(Achievement, bool), ApiError> {
        let storage_id = Achievement::storage_id(user_id, kind);
        let achievement = Achievement {
            id: storage_id.clone(),
            user_id: user_id.to_string(),
            kind: kind.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            earned_at: Utc::now(),
            metadata,
        };

        let mut on_insert =
            to_document(&achievement).context("Failed to serialize achievement")?;
        on_insert.remove("_id");

        let update = self
            .collection()
            .update_one(
                doc! { "_id": &storage_id },
                doc! { "$setOnInsert": on_insert },
            )
            .upsert(true)
            .await
            .context("Failed to upsert achievement")?;

        let newly_awarded = update.upserted_id.is_some();
        if newly_awarded {
            ACHIEVEMENTS_AWARDED_TOTAL.with_label_values(&[kind]).inc();
            tracing::info!("Achievement awarded: user={}, kind={}", user_id, kind);
        }

        let stored = self
            .collection()
            .find_one(doc! { "_id": &storage_id })
            .await
            .context("Failed to reload achievement")?
            .ok_or_else(|| {
                ApiError::Internal(anyhow::anyhow!(
                    "achievement {} missing after upsert",
                    storage_id
                ))
            })?;

        Ok((stored, newly_awarded))
    }

    /// All achievements for a learner, newest first.
    pub async fn list(&self, user_id: &str) -> Result<Vec<Achievement>, ApiError> {
        let cursor = self
            .collection()
            .find(doc! { "user_id": user_id })
            .await
            .context("Failed to query achievements")?;
        let mut achievements: Vec<Achievement> = cursor
            .try_collect()
            .await
            .context("Failed to collect achievements")?;

        achievements.sort_by(|a, b| b.earned_at.cmp(&a.earned_at));

        Ok(achievements)
    }
}
