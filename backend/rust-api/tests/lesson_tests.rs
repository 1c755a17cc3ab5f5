mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn completing_a_lesson_updates_progress_counters() {
    let app = common::create_test_app().await;
    let user_id = format!("lesson-user-{}", Uuid::new_v4());

    let (status, body) = common::post_json(
        &app,
        &format!("/api/v1/progress/{}/lessons", user_id),
        json!({ "module": "grammar", "lesson_id": "a1-grammar-01", "score": 90 }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["already_completed"], false);
    assert_eq!(body["lessons_completed"], 1);
    assert_eq!(body["vocabulary_count"], 0);
    assert!(body["current_streak_days"].as_u64().unwrap() >= 1);

    let (status, progress) =
        common::get_json(&app, &format!("/api/v1/progress/{}", user_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["current_level"], "A1");
    assert_eq!(progress["lessons_completed"], 1);
}

#[tokio::test]
async fn repeat_completion_is_a_no_op_success() {
    let app = common::create_test_app().await;
    let user_id = format!("lesson-user-{}", Uuid::new_v4());
    let payload = json!({ "module": "reading", "lesson_id": "a1-reading-07" });

    let (first_status, _) = common::post_json(
        &app,
        &format!("/api/v1/progress/{}/lessons", user_id),
        payload.clone(),
    )
    .await;
    assert_eq!(first_status, StatusCode::CREATED);

    let (second_status, body) = common::post_json(
        &app,
        &format!("/api/v1/progress/{}/lessons", user_id),
        payload,
    )
    .await;

    assert_eq!(second_status, StatusCode::OK);
    assert_eq!(body["already_completed"], true);
    // Counter did not move
    assert_eq!(body["lessons_completed"], 1);
}

#[tokio::test]
async fn vocabulary_lessons_bump_the_vocabulary_counter() {
    let app = common::create_test_app().await;
    let user_id = format!("lesson-user-{}", Uuid::new_v4());

    common::complete_lessons(&app, &user_id, "vocabulary", "a1-", 3).await;

    let (_, progress) = common::get_json(&app, &format!("/api/v1/progress/{}", user_id)).await;
    assert_eq!(progress["lessons_completed"], 3);
    assert_eq!(progress["vocabulary_count"], 3);
}

#[tokio::test]
async fn first_lesson_awards_the_first_steps_achievement() {
    let app = common::create_test_app().await;
    let user_id = format!("lesson-user-{}", Uuid::new_v4());

    common::complete_lessons(&app, &user_id, "writing", "a1-", 2).await;

    let (status, achievements) = common::get_json(
        &app,
        &format!("/api/v1/progress/{}/achievements", user_id),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let achievements = achievements.as_array().unwrap();
    // Two lessons, one badge: the award is once per learner
    assert_eq!(achievements.len(), 1);
    assert_eq!(achievements[0]["kind"], "first_lesson");
}

#[tokio::test]
async fn unknown_module_is_rejected() {
    let app = common::create_test_app().await;
    let user_id = format!("lesson-user-{}", Uuid::new_v4());

    let (status, body) = common::post_json(
        &app,
        &format!("/api/v1/progress/{}/lessons", user_id),
        json!({ "module": "listening", "lesson_id": "a1-listening-01" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("unknown module"));
}

#[tokio::test]
async fn empty_lesson_id_is_rejected() {
    let app = common::create_test_app().await;
    let user_id = format!("lesson-user-{}", Uuid::new_v4());

    let (status, _) = common::post_json(
        &app,
        &format!("/api/v1/progress/{}/lessons", user_id),
        json!({ "module": "grammar", "lesson_id": "" }),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_learner_progress_is_not_found() {
    let app = common::create_test_app().await;

    let (status, body) = common::get_json(
        &app,
        &format!("/api/v1/progress/ghost-{}", Uuid::new_v4()),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("not found"));
}
