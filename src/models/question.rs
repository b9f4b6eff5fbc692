// src/models/question.rs

use serde::Serialize;

use crate::{models::attempt::RowId, services::exam::ExamQuestion};

/// DTO for sending an exam question to the client.
/// Excludes the correct answer; it only appears as one of the options.
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    /// Position in the exam, starting at 1.
    pub number: usize,
    pub row_id: RowId,
    pub question_id: String,
    pub topic: String,
    pub difficulty: String,
    #[serde(rename = "type")]
    pub question_type: String,
    pub options: Vec<String>,
    /// Current selection (first option until the student picks one).
    pub selected: String,
}

impl PublicQuestion {
    pub fn new(number: usize, question: &ExamQuestion, selected: &str) -> Self {
        Self {
            number,
            row_id: question.row_id,
            question_id: question.source.question_id.clone(),
            topic: question.source.topic.clone(),
            difficulty: question.source.difficulty.clone(),
            question_type: question.source.question_type.clone(),
            options: question.options.clone(),
            selected: selected.to_string(),
        }
    }
}
