// src/handlers/recommendations.rs

use std::sync::Arc;

use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{
    error::AppError,
    models::{attempt::Attempt, report::RecommendationsResponse},
    services::{analytics, recommendation},
    state::SharedStore,
    store::RuleTable,
    utils::jwt::Claims,
};

/// Topics the current student should focus on, with their accuracy on each.
pub async fn get_recommendations(
    State(store): State<SharedStore>,
    State(rules): State<Arc<RuleTable>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let store = store.read().await;
    let topics = recommendation::recommend(&claims.sub, store.attempts(), &rules);
    let rows: Vec<&Attempt> = store.for_student(&claims.sub).map(|(_, a)| a).collect();

    Ok(Json(RecommendationsResponse {
        student_id: claims.sub.clone(),
        all_clear: topics.is_empty(),
        topics: analytics::recommended_topics(&topics, &rows, &rules),
    }))
}
