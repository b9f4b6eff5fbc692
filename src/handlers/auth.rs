// src/handlers/auth.rs

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::student::{LoginRequest, LoginResponse},
    state::SharedStore,
    utils::jwt::sign_jwt,
};

/// Logs a student in by id.
///
/// The id must appear in the attempt log; anything else is rejected with
/// 401 before any other work is done.
/// On success signs a JWT carrying the student id.
pub async fn login(
    State(store): State<SharedStore>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    // Matched byte for byte against the log; no trimming or case folding.
    let student_id = payload.student_id.as_str();
    let known = store.read().await.contains_student(student_id);
    if !known {
        tracing::info!("Rejected login for unknown student id");
        return Err(AppError::AuthError("Invalid Student ID".to_string()));
    }

    let token = sign_jwt(student_id, &config.jwt_secret, config.jwt_expiration)?;
    tracing::info!("Student {} logged in", student_id);

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        student_id: student_id.to_string(),
        expires_in: config.jwt_expiration,
    }))
}
