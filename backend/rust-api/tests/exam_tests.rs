mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn generate_returns_35_questions_without_answer_keys() {
    let app = common::create_test_app().await;

    let (status, body) = common::post_json(&app, "/api/v1/exams/generate", json!({ "level": "A1" })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["level"], "A1");

    let questions = body["questions"].as_array().unwrap();
    assert_eq!(questions.len(), 35);

    for question in questions {
        assert!(question["id"].is_string());
        assert!(question["category"].is_string());
        assert!(question["question"].is_string());
        assert_eq!(question["options"].as_array().unwrap().len(), 4);
        // The grading key must never reach the client
        assert!(question.get("correct_index").is_none());
        assert!(question.get("explanation").is_none());
    }
}

#[tokio::test]
async fn generate_fails_for_empty_pool() {
    let app = common::create_test_app().await;

    // B2 is never seeded in the test bank
    let (status, body) = common::post_json(&app, "/api/v1/exams/generate", json!({ "level": "B2" })).await;

    assert_eq!(status, StatusCode::CONFLICT);
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("insufficient question pool"));
    assert!(message.contains("B2"));
}

#[tokio::test]
async fn generate_rejects_unknown_level() {
    let app = common::create_test_app().await;

    let (status, body) = common::post_json(&app, "/api/v1/exams/generate", json!({ "level": "Z9" })).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("unknown level"));
}

#[tokio::test]
async fn perfect_submission_scores_100() {
    let app = common::create_test_app().await;
    let user_id = format!("exam-user-{}", Uuid::new_v4());

    let (status, body) = common::post_json(
        &app,
        "/api/v1/exams/submit",
        json!({ "user_id": user_id, "level": "A1", "answers": common::a1_answers(35), "time_spent_seconds": 900 }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["score"], 100);
    assert_eq!(body["correct_count"], 35);
    assert_eq!(body["total"], 35);
    assert_eq!(body["passed"], true);
    assert_eq!(body["time_spent_seconds"], 900);
    assert!(body["attempt_id"].is_string());
}

#[tokio::test]
async fn score_25_of_35_rounds_to_71_and_passes() {
    let app = common::create_test_app().await;
    let user_id = format!("exam-user-{}", Uuid::new_v4());

    let (status, body) = common::post_json(
        &app,
        "/api/v1/exams/submit",
        json!({ "user_id": user_id, "level": "A1", "answers": common::a1_answers(25) }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["score"], 71);
    assert_eq!(body["passed"], true);
}

#[tokio::test]
async fn score_24_of_35_rounds_to_69_and_fails() {
    let app = common::create_test_app().await;
    let user_id = format!("exam-user-{}", Uuid::new_v4());

    let (status, body) = common::post_json(
        &app,
        "/api/v1/exams/submit",
        json!({ "user_id": user_id, "level": "A1", "answers": common::a1_answers(24) }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["score"], 69);
    assert_eq!(body["passed"], false);
}

#[tokio::test]
async fn category_breakdown_covers_all_35_answers() {
    let app = common::create_test_app().await;
    let user_id = format!("exam-user-{}", Uuid::new_v4());

    let (_, body) = common::post_json(
        &app,
        "/api/v1/exams/submit",
        json!({ "user_id": user_id, "level": "A1", "answers": common::a1_answers(20) }),
    )
    .await;

    let breakdown = body["category_breakdown"].as_object().unwrap();
    let total: u64 = breakdown
        .values()
        .map(|stat| stat["total"].as_u64().unwrap())
        .sum();
    let correct: u64 = breakdown
        .values()
        .map(|stat| stat["correct"].as_u64().unwrap())
        .sum();

    assert_eq!(total, 35);
    assert_eq!(correct, 20);
}

#[tokio::test]
async fn wrong_answer_count_is_rejected() {
    let app = common::create_test_app().await;
    let user_id = format!("exam-user-{}", Uuid::new_v4());

    for count in [10usize, 40] {
        let answers: Vec<_> = (0..count)
            .map(|i| {
                json!({
                    "question_id": common::a1_question_id(i % common::A1_POOL_SIZE),
                    "selected_index": 0
                })
            })
            .collect();

        let (status, body) = common::post_json(
            &app,
            "/api/v1/exams/submit",
            json!({ "user_id": user_id, "level": "A1", "answers": answers }),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "count={}", count);
        assert!(body["error"].as_str().unwrap().contains("35"));
    }
}

#[tokio::test]
async fn unknown_question_ids_are_dropped_from_the_tally() {
    let app = common::create_test_app().await;
    let user_id = format!("exam-user-{}", Uuid::new_v4());

    // 30 correct answers + 5 answers that reference questions that do not exist
    let mut answers = common::a1_answers(30).as_array().unwrap()[..30].to_vec();
    for i in 0..5 {
        answers.push(json!({ "question_id": format!("ghost-{}", i), "selected_index": 0 }));
    }

    let (status, body) = common::post_json(
        &app,
        "/api/v1/exams/submit",
        json!({ "user_id": user_id, "level": "A1", "answers": answers }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    // Score stays out of 35: round(30 / 35 * 100) = 86
    assert_eq!(body["correct_count"], 30);
    assert_eq!(body["score"], 86);
    assert_eq!(body["answers"].as_array().unwrap().len(), 30);
}

#[tokio::test]
async fn submission_with_only_unknown_ids_fails() {
    let app = common::create_test_app().await;
    let user_id = format!("exam-user-{}", Uuid::new_v4());

    let answers: Vec<_> = (0..35)
        .map(|i| json!({ "question_id": format!("ghost-{}", i), "selected_index": 0 }))
        .collect();

    let (status, body) = common::post_json(
        &app,
        "/api/v1/exams/submit",
        json!({ "user_id": user_id, "level": "A1", "answers": answers }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("none of the submitted question ids"));
}

#[tokio::test]
async fn replayed_submission_returns_the_original_attempt() {
    let app = common::create_test_app().await;
    let user_id = format!("exam-user-{}", Uuid::new_v4());
    let key = format!("replay-{}", Uuid::new_v4());

    let payload = json!({
        "user_id": user_id,
        "level": "A1",
        "answers": common::a1_answers(35),
        "idempotency_key": key,
    });

    let (_, first) = common::post_json(&app, "/api/v1/exams/submit", payload.clone()).await;
    let (status, second) = common::post_json(&app, "/api/v1/exams/submit", payload).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["attempt_id"], first["attempt_id"]);
    assert_eq!(second["score"], first["score"]);
}

#[tokio::test]
async fn attempt_can_be_fetched_and_listed() {
    let app = common::create_test_app().await;
    let user_id = format!("exam-user-{}", Uuid::new_v4());

    let (_, submitted) = common::post_json(
        &app,
        "/api/v1/exams/submit",
        json!({ "user_id": user_id, "level": "A1", "answers": common::a1_answers(30) }),
    )
    .await;
    let attempt_id = submitted["attempt_id"].as_str().unwrap();

    let (status, attempt) =
        common::get_json(&app, &format!("/api/v1/exams/attempts/{}", attempt_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(attempt["user_id"], user_id.as_str());
    assert_eq!(attempt["score"], 86);

    let (status, attempts) = common::get_json(
        &app,
        &format!("/api/v1/exams/learners/{}/attempts", user_id),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let attempts = attempts.as_array().unwrap();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0]["attempt_id"], attempt_id);
}

#[tokio::test]
async fn unknown_attempt_id_is_not_found() {
    let app = common::create_test_app().await;

    let (status, body) = common::get_json(
        &app,
        &format!("/api/v1/exams/attempts/{}", Uuid::new_v4()),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}
