// src/services/exam.rs

//! Exam sessions: sampling, answer tracking and scoring.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use rand::{Rng, seq::index};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    config::{EXAM_QUESTION_COUNT, FILLER_OPTIONS, TIME_SPENT_RANGE},
    models::attempt::{Attempt, RowId},
};

#[derive(Debug, Error, PartialEq)]
pub enum ExamError {
    #[error("Exam already submitted")]
    AlreadySubmitted,

    #[error("Question {0} is not part of this exam")]
    UnknownQuestion(RowId),

    #[error("'{answer}' is not an option of question {row_id}")]
    InvalidOption { row_id: RowId, answer: String },

    #[error("No results waiting to be saved")]
    NothingPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unstarted,
    InProgress,
    Submitted,
}

/// Whether the exam was narrowed to recommended topics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExamFocus {
    WeakTopics { topics: BTreeSet<String> },
    General,
}

/// A sampled row, frozen at session start.
#[derive(Debug, Clone)]
pub struct ExamQuestion {
    pub row_id: RowId,
    pub source: Attempt,
    pub options: Vec<String>,
}

impl ExamQuestion {
    fn new(row_id: RowId, source: Attempt) -> Self {
        let mut options: Vec<String> = FILLER_OPTIONS.iter().map(|o| o.to_string()).collect();
        options.push(source.correct_answer.clone());
        Self {
            row_id,
            source,
            options,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionResult {
    pub row_id: RowId,
    pub question_id: String,
    pub topic: String,
    pub student_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExamOutcome {
    pub correct_count: usize,
    pub total_questions: usize,
    /// Percentage, 0 for an empty exam.
    pub accuracy: f64,
    pub results: Vec<QuestionResult>,
}

/// Picks up to `count` distinct row ids, uniformly without replacement.
///
/// Rows of `topics` are preferred; an empty topic set, or one no row belongs
/// to, means the whole pool.
pub fn sample_questions<R: Rng + ?Sized>(
    topics: &BTreeSet<String>,
    pool: &[Attempt],
    count: usize,
    rng: &mut R,
) -> Vec<RowId> {
    let mut candidates: Vec<RowId> = if topics.is_empty() {
        Vec::new()
    } else {
        pool.iter()
            .enumerate()
            .filter(|(_, a)| topics.contains(&a.topic))
            .map(|(row, _)| row)
            .collect()
    };
    if candidates.is_empty() {
        candidates = (0..pool.len()).collect();
    }

    let amount = count.min(candidates.len());
    index::sample(rng, candidates.len(), amount)
        .into_iter()
        .map(|i| candidates[i])
        .collect()
}

/// One student's exam, from sampling to submission.
#[derive(Debug, Clone)]
pub struct ExamSession {
    id: Uuid,
    student_id: String,
    created_at: DateTime<Utc>,
    focus: ExamFocus,
    questions: Vec<ExamQuestion>,
    answers: HashMap<RowId, String>,
    state: SessionState,
    outcome: Option<ExamOutcome>,
    pending: Vec<Attempt>,
    persisted: bool,
}

impl ExamSession {
    /// Draws a fresh sample. `topics` is the recommendation set, possibly empty.
    pub fn start<R: Rng + ?Sized>(
        student_id: &str,
        topics: &BTreeSet<String>,
        pool: &[Attempt],
        rng: &mut R,
    ) -> Self {
        let questions: Vec<ExamQuestion> = sample_questions(topics, pool, EXAM_QUESTION_COUNT, rng)
            .into_iter()
            .map(|row| ExamQuestion::new(row, pool[row].clone()))
            .collect();

        let focused = !topics.is_empty()
            && questions.iter().any(|q| topics.contains(&q.source.topic));
        let focus = if focused {
            ExamFocus::WeakTopics {
                topics: topics.clone(),
            }
        } else {
            ExamFocus::General
        };

        Self {
            id: Uuid::new_v4(),
            student_id: student_id.to_string(),
            created_at: Utc::now(),
            focus,
            questions,
            answers: HashMap::new(),
            state: SessionState::Unstarted,
            outcome: None,
            pending: Vec::new(),
            persisted: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn focus(&self) -> &ExamFocus {
        &self.focus
    }

    pub fn questions(&self) -> &[ExamQuestion] {
        &self.questions
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn outcome(&self) -> Option<&ExamOutcome> {
        self.outcome.as_ref()
    }

    /// Rows scored but not yet written to the store.
    pub fn pending(&self) -> &[Attempt] {
        &self.pending
    }

    /// The current selection, or the first option when nothing was picked.
    pub fn answer_for<'a>(&'a self, question: &'a ExamQuestion) -> &'a str {
        self.answers
            .get(&question.row_id)
            .map(String::as_str)
            .unwrap_or(question.options[0].as_str())
    }

    pub fn select_answer(&mut self, row_id: RowId, answer: &str) -> Result<(), ExamError> {
        if self.state == SessionState::Submitted {
            return Err(ExamError::AlreadySubmitted);
        }
        let question = self
            .questions
            .iter()
            .find(|q| q.row_id == row_id)
            .ok_or(ExamError::UnknownQuestion(row_id))?;
        if !question.options.iter().any(|o| o == answer) {
            return Err(ExamError::InvalidOption {
                row_id,
                answer: answer.to_string(),
            });
        }

        self.answers.insert(row_id, answer.to_string());
        self.state = SessionState::InProgress;
        Ok(())
    }

    /// Scores the exam and queues one new attempt row per question.
    ///
    /// The session becomes `Submitted` whether or not the rows are later
    /// written; see [`ExamSession::mark_persisted`].
    pub fn submit<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<ExamOutcome, ExamError> {
        if self.state == SessionState::Submitted {
            return Err(ExamError::AlreadySubmitted);
        }

        let mut results = Vec::with_capacity(self.questions.len());
        let mut rows = Vec::with_capacity(self.questions.len());

        for question in &self.questions {
            let answer = self.answer_for(question).to_string();
            let q = &question.source;
            let correct = answer == q.correct_answer;

            rows.push(Attempt {
                student_id: self.student_id.clone(),
                question_id: q.question_id.clone(),
                topic: q.topic.clone(),
                difficulty: q.difficulty.clone(),
                question_type: q.question_type.clone(),
                student_answer: answer.clone(),
                correct_answer: q.correct_answer.clone(),
                is_correct: correct,
                score: u32::from(correct),
                time_spent: f64::from(rng.random_range(TIME_SPENT_RANGE)),
            });
            results.push(QuestionResult {
                row_id: question.row_id,
                question_id: q.question_id.clone(),
                topic: q.topic.clone(),
                student_answer: answer,
                correct_answer: q.correct_answer.clone(),
                is_correct: correct,
            });
        }

        let correct_count = results.iter().filter(|r| r.is_correct).count();
        let total_questions = results.len();
        let accuracy = if total_questions == 0 {
            0.0
        } else {
            correct_count as f64 / total_questions as f64 * 100.0
        };

        let outcome = ExamOutcome {
            correct_count,
            total_questions,
            accuracy,
            results,
        };

        self.state = SessionState::Submitted;
        self.outcome = Some(outcome.clone());
        self.pending = rows;
        Ok(outcome)
    }

    /// Hands out the pending rows for writing.
    pub fn take_pending(&mut self) -> Result<Vec<Attempt>, ExamError> {
        if self.state != SessionState::Submitted || self.pending.is_empty() {
            return Err(ExamError::NothingPending);
        }
        Ok(std::mem::take(&mut self.pending))
    }

    /// Puts rows back after a failed write so a retry can pick them up.
    pub fn restore_pending(&mut self, rows: Vec<Attempt>) {
        self.pending = rows;
    }

    pub fn mark_persisted(&mut self) {
        self.pending.clear();
        self.persisted = true;
    }

    pub fn is_persisted(&self) -> bool {
        self.persisted
    }
}
