mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use base64::{engine::general_purpose, Engine as _};
use serial_test::serial;
use tower::ServiceExt;

#[tokio::test]
async fn health_reports_dependencies() {
    let app = common::create_test_app().await;

    let (status, body) = common::get_json(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "lingualevel-api");
    assert_eq!(body["dependencies"]["mongodb"]["status"], "healthy");
    assert_eq!(body["dependencies"]["redis"]["status"], "healthy");
}

#[tokio::test]
#[serial]
async fn metrics_requires_basic_auth() {
    let app = common::create_test_app().await;

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[serial]
async fn metrics_renders_with_valid_credentials() {
    // serial: METRICS_AUTH is process-wide
    std::env::set_var("METRICS_AUTH", "metrics:secret");

    let app = common::create_test_app().await;

    // Generate at least one request so the HTTP counters are populated
    let _ = common::get_json(&app, "/health").await;

    let credentials = general_purpose::STANDARD.encode("metrics:secret");
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .header("authorization", format!("Basic {}", credentials))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("http_requests_total"));

    std::env::remove_var("METRICS_AUTH");
}
