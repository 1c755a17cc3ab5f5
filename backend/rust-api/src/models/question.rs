use serde::{Deserialize, Serialize};

use super::Level;

/// Question stored in the MongoDB "questions" collection. Reference data:
/// seeded at startup, never mutated by learner actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: String,
    pub level: Level,
    /// Grammatical category tag, e.g. "syntax" or "verb-forms".
    pub category: String,
    pub prompt: String,
    /// Ordered answer options as displayed to the learner.
    pub options: Vec<String>,
    pub correct_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// Client-facing view of a question: the correct answer and the explanation
/// are stripped before anything leaves the server.
#[derive(Debug, Serialize)]
pub struct ExamQuestion {
    pub id: String,
    pub category: String,
    pub question: String,
    pub options: Vec<String>,
}

impl From<Question> for ExamQuestion {
    fn from(q: Question) -> Self {
        ExamQuestion {
            id: q.id,
            category: q.category,
            question: q.prompt,
            options: q.options,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GenerateExamRequest {
    pub level: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateExamResponse {
    pub level: Level,
    pub questions: Vec<ExamQuestion>,
}
