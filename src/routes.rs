// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{analytics, auth, health, profile, quiz, recommendations},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Public: health check and login.
/// * Behind the JWT middleware: dashboard, analytics, recommendations, exam.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new().route("/login", post(auth::login));

    let exam_routes = Router::new()
        .route("/sessions", post(quiz::start_exam))
        .route("/sessions/{id}", get(quiz::get_exam))
        .route("/sessions/{id}/answers", put(quiz::select_answers))
        .route("/sessions/{id}/submit", post(quiz::submit_exam))
        .route("/sessions/{id}/persist", post(quiz::persist_exam));

    // Unknown paths stay 404 because the auth check is a route layer.
    let protected_routes = Router::new()
        .route("/api/dashboard", get(profile::get_dashboard))
        .route("/api/analytics", get(analytics::get_analytics))
        .route("/api/recommendations", get(recommendations::get_recommendations))
        .nest("/api/exam", exam_routes)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/api/health", get(health::health_check))
        .nest("/api/auth", auth_routes)
        .merge(protected_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
