use crate::config::Config;
use crate::models::question::Question;
use crate::models::Level;
use anyhow::{Context, Result};
use mongodb::{
    bson::{doc, to_document, Document},
    Database,
};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;

/// One entry of the question-bank seed file. Kept separate from the stored
/// model so the file uses a plain `id` field.
#[derive(Debug, Deserialize)]
pub struct QuestionSeed {
    pub id: String,
    pub level: Level,
    pub category: String,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: u32,
    #[serde(default)]
    pub explanation: Option<String>,
}

impl QuestionSeed {
    fn into_question(self) -> Question {
        Question {
            id: self.id,
            level: self.level,
            category: self.category,
            prompt: self.prompt,
            options: self.options,
            correct_index: self.correct_index,
            explanation: self.explanation,
        }
    }
}

/// Idempotent question-bank bootstrap: existing questions are left untouched,
/// missing ones are inserted. Runs at startup when a seed file is configured.
pub async fn bootstrap(config: &Config, mongo: &Database) -> Result<()> {
    let path = match &config.question_seed_file {
        Some(path) if !path.is_empty() => Path::new(path),
        _ => {
            tracing::debug!("No question seed file configured, skipping bootstrap");
            return Ok(());
        }
    };

    if !path.exists() {
        tracing::warn!(
            "Question seed file {} not found, skipping bootstrap",
            path.display()
        );
        return Ok(());
    }

    let contents = fs::read_to_string(path)
        .await
        .context("Failed to read question seed file")?;

    let seeds: Vec<QuestionSeed> =
        serde_json::from_str(&contents).context("Failed to deserialize question seed payload")?;

    let collection = mongo.collection::<Document>("questions");
    let mut inserted = 0usize;
    let total = seeds.len();

    for seed in seeds {
        let question = seed.into_question();
        let id = question.id.clone();
        let mut on_insert =
            to_document(&question).context("Failed to serialize seed question")?;
        on_insert.remove("_id");

        let update = collection
            .update_one(doc! { "_id": &id }, doc! { "$setOnInsert": on_insert })
            .upsert(true)
            .await
            .with_context(|| format!("Failed to upsert seed question {}", id))?;

        if update.upserted_id.is_some() {
            inserted += 1;
        }
    }

    tracing::info!(
        "Question bank bootstrap: {} of {} seed questions inserted",
        inserted,
        total
    );

    Ok(())
}
