// src/handlers/analytics.rs

use axum::{Json, extract::State, response::IntoResponse};

use crate::{
    error::AppError, models::report::AnalyticsResponse, services::analytics, state::SharedStore,
};

/// Class-wide analytics over every recorded attempt.
pub async fn get_analytics(State(store): State<SharedStore>) -> Result<impl IntoResponse, AppError> {
    let store = store.read().await;
    let attempts = store.attempts();

    Ok(Json(AnalyticsResponse {
        error_rate_by_topic: analytics::error_rate_by_topic(attempts),
        time_by_difficulty: analytics::time_by_difficulty(attempts),
        insights: analytics::insights(attempts),
    }))
}
