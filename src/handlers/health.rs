// src/handlers/health.rs

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::{services::sessions::SessionRegistry, state::SharedStore, store::RuleTable};

/// Liveness probe with table sizes.
pub async fn health_check(
    State(store): State<SharedStore>,
    State(rules): State<Arc<RuleTable>>,
    State(sessions): State<Arc<SessionRegistry>>,
) -> impl IntoResponse {
    let store = store.read().await;

    Json(json!({
        "status": "ok",
        "attempts": store.len(),
        "students": store.student_count(),
        "rules": rules.len(),
        "rule_match": rules.mode().to_string(),
        "open_sessions": sessions.len().await,
    }))
}
