use chrono::{DateTime, Utc};
use mongodb::bson::Document;
use serde::{Deserialize, Serialize};

/// Achievement record, unique per (learner, kind). The `_id` encodes the
/// uniqueness constraint so a second award of the same kind is an upsert
/// no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Achievement {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub title: String,
    pub description: String,
    pub earned_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Document>,
}

impl Achievement {
    pub fn storage_id(user_id: &str, kind: &str) -> String {
        format!("{}:{}", user_id, kind)
    }
}

/// Client-facing achievement view.
#[derive(Debug, Serialize)]
pub struct AchievementSummary {
    pub kind: String,
    pub title: String,
    pub description: String,
    pub earned_at: DateTime<Utc>,
}

impl From<Achievement> for AchievementSummary {
    fn from(a: Achievement) -> Self {
        AchievementSummary {
            kind: a.kind,
            title: a.title,
            description: a.description,
            earned_at: a.earned_at,
        }
    }
}
