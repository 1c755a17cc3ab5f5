use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;

pub use config::Config;
pub use services::AppState;

/// CSP middleware adds Content-Security-Policy header to all responses
async fn csp_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; \
             script-src 'self' 'unsafe-inline'; \
             style-src 'self' 'unsafe-inline'; \
             img-src 'self' data: https:; \
             connect-src 'self'",
        ),
    );
    response
}

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    // CORS for the learner-facing API
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any); // TODO: restrict to specific origins in production

    Router::new()
        // Public endpoints (no auth required)
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        .nest("/api/v1/exams", exam_routes().layer(cors.clone()))
        .nest("/api/v1/progress", progress_routes().layer(cors))
        .with_state(app_state)
        .layer(middleware::from_fn(csp_middleware)) // Apply CSP to all responses
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn exam_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/generate", post(handlers::exams::generate_exam))
        .route("/submit", post(handlers::exams::submit_exam))
        .route("/attempts/{id}", get(handlers::exams::get_attempt))
        .route(
            "/learners/{user_id}/attempts",
            get(handlers::exams::list_attempts),
        )
}

fn progress_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/{user_id}", get(handlers::progress::get_progress))
        .route(
            "/{user_id}/lessons",
            post(handlers::progress::complete_lesson),
        )
        .route(
            "/{user_id}/eligibility",
            get(handlers::progress::check_eligibility),
        )
        .route(
            "/{user_id}/upgrade",
            post(handlers::progress::upgrade_level),
        )
        .route(
            "/{user_id}/achievements",
            get(handlers::progress::list_achievements),
        )
}
