// src/models/exam_record.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    models::{attempt::RowId, question::PublicQuestion},
    services::exam::{ExamFocus, ExamOutcome, ExamSession, SessionState},
};

/// DTO for returning an exam session.
#[derive(Debug, Serialize)]
pub struct ExamResponse {
    pub session_id: Uuid,
    pub state: SessionState,
    pub focus: ExamFocus,
    pub questions: Vec<PublicQuestion>,
    pub created_at: DateTime<Utc>,
    pub expires_in: u64, // seconds
    /// Present once the exam is submitted.
    pub outcome: Option<ExamOutcome>,
    pub persisted: bool,
}

impl ExamResponse {
    pub fn from_session(session: &ExamSession, ttl_seconds: u64) -> Self {
        let questions = session
            .questions()
            .iter()
            .enumerate()
            .map(|(i, q)| PublicQuestion::new(i + 1, q, session.answer_for(q)))
            .collect();

        let elapsed = (Utc::now() - session.created_at()).num_seconds().max(0) as u64;

        Self {
            session_id: session.id(),
            state: session.state(),
            focus: session.focus().clone(),
            questions,
            created_at: session.created_at(),
            expires_in: ttl_seconds.saturating_sub(elapsed),
            outcome: session.outcome().cloned(),
            persisted: session.is_persisted(),
        }
    }
}

/// DTO for selecting answers.
#[derive(Debug, Deserialize)]
pub struct SelectAnswersRequest {
    /// User's answers map.
    /// Key: row id of the question
    /// Value: selected option
    pub answers: HashMap<RowId, String>,
}

/// DTO for submitting an exam. Answers given here are applied before scoring.
#[derive(Debug, Default, Deserialize)]
pub struct SubmitExamRequest {
    #[serde(default)]
    pub answers: HashMap<RowId, String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitExamResponse {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub outcome: ExamOutcome,
    /// False when the attempt log could not be written; retry via `/persist`.
    pub persisted: bool,
    pub message: String,
}
