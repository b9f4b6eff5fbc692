// src/handlers/profile.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};

use crate::{
    config::RECENT_ATTEMPTS_LIMIT,
    error::AppError,
    models::{
        attempt::{Attempt, RowId},
        report::DashboardResponse,
    },
    services::analytics,
    state::SharedStore,
    utils::jwt::Claims,
};

/// Get the current student's dashboard: headline metrics, performance by
/// topic and the most recent attempts.
pub async fn get_dashboard(
    State(store): State<SharedStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let store = store.read().await;
    let rows: Vec<(RowId, &Attempt)> = store.for_student(&claims.sub).collect();
    let attempts: Vec<&Attempt> = rows.iter().map(|(_, a)| *a).collect();

    Ok(Json(DashboardResponse {
        student_id: claims.sub.clone(),
        summary: analytics::student_summary(&attempts),
        topic_performance: analytics::topic_performance(&attempts),
        recent_attempts: analytics::recent_attempts(&rows, RECENT_ATTEMPTS_LIMIT),
    }))
}
