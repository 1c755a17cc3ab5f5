#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use mongodb::bson::doc;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use lingualevel_api::{config::Config, create_router, services::AppState};

/// Number of A1 questions seeded for tests; more than one exam's worth so
/// generation has room to sample.
pub const A1_POOL_SIZE: usize = 40;

const A1_CATEGORIES: [&str; 4] = ["syntax", "verb-forms", "articles", "word-order"];

pub async fn create_test_app() -> Router {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    // Load test environment from .env.test
    dotenvy::from_filename(".env.test").ok();

    // Load test configuration
    let config = Config::load().expect("Failed to load test configuration");

    // Connect to test databases
    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to connect to test MongoDB");

    let redis_client =
        redis::Client::open(config.redis_uri.clone()).expect("Failed to create test Redis client");

    // Create app state (connection is established inside)
    let app_state = Arc::new(
        AppState::new(config.clone(), mongo_client.clone(), redis_client)
            .await
            .expect("Failed to initialize test app state"),
    );

    // Seed the question bank used by the exam tests
    seed_question_bank(&mongo_client, &config.mongo_database).await;

    // Build test router (same as main app)
    create_router(app_state)
}

/// Deterministic A1 question bank: question i lives in category i % 4 and
/// has correct_index i % 4, so tests can construct submissions with a known
/// number of correct answers. Levels B2 and C1 are deliberately left empty
/// for the insufficient-pool tests. Upserts keep reseeding race-free across
/// parallel test binaries.
async fn seed_question_bank(mongo_client: &mongodb::Client, db_name: &str) {
    let db = mongo_client.database(db_name);
    let questions = db.collection::<mongodb::bson::Document>("questions");

    for i in 0..A1_POOL_SIZE {
        let id = a1_question_id(i);
        let on_insert = doc! {
            "level": "A1",
            "category": A1_CATEGORIES[i % A1_CATEGORIES.len()],
            "prompt": format!("Choose the correct form ({})", i),
            "options": ["option a", "option b", "option c", "option d"],
            "correct_index": correct_index_for(i),
            "explanation": "The other forms do not agree with the subject.",
        };

        questions
            .update_one(doc! { "_id": &id }, doc! { "$setOnInsert": on_insert })
            .upsert(true)
            .await
            .expect("Failed to seed test question");
    }
}

pub fn a1_question_id(i: usize) -> String {
    format!("a1-q-{:03}", i)
}

pub fn correct_index_for(i: usize) -> i32 {
    (i % 4) as i32
}

/// A 35-answer A1 submission with exactly `n_correct` correct answers.
pub fn a1_answers(n_correct: usize) -> Value {
    let answers: Vec<Value> = (0..35)
        .map(|i| {
            let correct = correct_index_for(i);
            let selected = if i < n_correct {
                correct
            } else {
                (correct + 1) % 4
            };
            json!({ "question_id": a1_question_id(i), "selected_index": selected })
        })
        .collect();
    json!(answers)
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Complete `count` lessons in a module with level-prefixed lesson ids.
pub async fn complete_lessons(app: &Router, user_id: &str, module: &str, prefix: &str, count: usize) {
    for i in 0..count {
        let (status, _) = post_json(
            app,
            &format!("/api/v1/progress/{}/lessons", user_id),
            json!({ "module": module, "lesson_id": format!("{}{}-{:02}", prefix, module, i) }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }
}

/// Satisfy every A1 requirement for the learner: 14 grammar lessons plus a
/// passed exam (the 15th grammar slot), 10 reading, 3 writing, 4 vocabulary.
pub async fn make_eligible_for_a2(app: &Router, user_id: &str) {
    complete_lessons(app, user_id, "grammar", "a1-", 14).await;
    complete_lessons(app, user_id, "reading", "a1-", 10).await;
    complete_lessons(app, user_id, "writing", "a1-", 3).await;
    complete_lessons(app, user_id, "vocabulary", "a1-", 4).await;

    let (status, body) = post_json(
        app,
        "/api/v1/exams/submit",
        json!({ "user_id": user_id, "level": "A1", "answers": a1_answers(35) }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["passed"], true);
}
