// src/models/student.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// DTO for student login.
/// The id is only looked up in the attempt log, there is no password.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(
        min = 1,
        max = 64,
        message = "Student ID length must be between 1 and 64 characters."
    ))]
    pub student_id: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(rename = "type")]
    pub token_type: &'static str,
    pub student_id: String,
    pub expires_in: u64,
}
