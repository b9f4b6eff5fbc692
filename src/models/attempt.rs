// src/models/attempt.rs

use serde::{Deserialize, Deserializer, Serialize};

/// Zero-based position of an attempt in the store.
/// Stable for the lifetime of the file because the store is append-only.
pub type RowId = usize;

/// One answer event, i.e. one row of the attempts CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub student_id: String,
    pub question_id: String,
    pub topic: String,
    pub difficulty: String,
    pub question_type: String,
    pub student_answer: String,
    pub correct_answer: String,

    /// Stored as `0`/`1` in the file.
    #[serde(deserialize_with = "de_flag", serialize_with = "ser_flag")]
    pub is_correct: bool,

    /// Always equal to `is_correct` for rows written by this service.
    #[serde(deserialize_with = "de_count")]
    pub score: u32,

    /// Seconds.
    pub time_spent: f64,
}

impl Attempt {
    /// Every column the store needs to find in the header.
    pub const COLUMNS: [&'static str; 10] = [
        "student_id",
        "question_id",
        "topic",
        "difficulty",
        "question_type",
        "student_answer",
        "correct_answer",
        "is_correct",
        "score",
        "time_spent",
    ];

    /// Renders a single column in the on-disk format.
    /// Columns the service does not know about are written empty.
    pub fn column_value(&self, column: &str) -> String {
        match column {
            "student_id" => self.student_id.clone(),
            "question_id" => self.question_id.clone(),
            "topic" => self.topic.clone(),
            "difficulty" => self.difficulty.clone(),
            "question_type" => self.question_type.clone(),
            "student_answer" => self.student_answer.clone(),
            "correct_answer" => self.correct_answer.clone(),
            "is_correct" => u8::from(self.is_correct).to_string(),
            "score" => self.score.to_string(),
            "time_spent" => self.time_spent.to_string(),
            _ => String::new(),
        }
    }
}

fn ser_flag<S: serde::Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*value))
}

/// Accepts `0`/`1`, `0.0`/`1.0` and `true`/`false` in any case.
fn de_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid flag '{}'", raw)))
}

fn de_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_count(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid score '{}'", raw)))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" => Some(true),
        "0" | "0.0" | "false" => Some(false),
        _ => None,
    }
}

fn parse_count(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u32>() {
        return Some(n);
    }
    match raw.parse::<f64>() {
        Ok(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => Some(f as u32),
        _ => parse_flag(raw).map(u32::from),
    }
}
