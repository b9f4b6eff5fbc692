// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        attempt::Attempt,
        exam_record::{ExamResponse, SelectAnswersRequest, SubmitExamRequest, SubmitExamResponse},
    },
    services::{exam::ExamSession, recommendation, sessions::SessionRegistry},
    state::SharedStore,
    store::RuleTable,
    utils::jwt::Claims,
};

/// Starts a fresh exam for the current student.
///
/// * Resolves the student's recommended topics.
/// * Samples up to 5 questions from those topics, or from every topic when
///   there are none.
/// * Replaces any exam the student already had open.
pub async fn start_exam(
    State(store): State<SharedStore>,
    State(rules): State<Arc<RuleTable>>,
    State(sessions): State<Arc<SessionRegistry>>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let session = {
        let store = store.read().await;
        let topics = recommendation::recommend(&claims.sub, store.attempts(), &rules);
        ExamSession::start(&claims.sub, &topics, store.attempts(), &mut rand::rng())
    };

    tracing::info!(
        "Student {} started exam {} with {} questions ({:?})",
        claims.sub,
        session.id(),
        session.questions().len(),
        session.focus()
    );

    let response = ExamResponse::from_session(&session, sessions.ttl_seconds());
    sessions.open(session).await;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Returns the current state of an exam.
pub async fn get_exam(
    State(sessions): State<Arc<SessionRegistry>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ttl = sessions.ttl_seconds();
    let response = sessions
        .with_session(id, &claims.sub, |s| Ok(ExamResponse::from_session(s, ttl)))
        .await?;

    Ok(Json(response))
}

/// Records answer selections. Every selection is checked before any is applied.
pub async fn select_answers(
    State(sessions): State<Arc<SessionRegistry>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    if req.answers.is_empty() {
        return Err(AppError::BadRequest("No answers submitted".to_string()));
    }

    let ttl = sessions.ttl_seconds();
    let response = sessions
        .with_session(id, &claims.sub, |s| {
            let mut draft = s.clone();
            for (row_id, answer) in &req.answers {
                draft.select_answer(*row_id, answer)?;
            }
            *s = draft;
            Ok(ExamResponse::from_session(s, ttl))
        })
        .await?;

    Ok(Json(response))
}

/// Submits the exam.
///
/// * Applies any answers sent with the request, then scores the exam.
/// * Appends one attempt row per question to the attempt log.
/// * The score is returned even when the append fails; `persisted` tells the
///   client whether to retry via `/persist`.
pub async fn submit_exam(
    State(store): State<SharedStore>,
    State(sessions): State<Arc<SessionRegistry>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    req: Option<Json<SubmitExamRequest>>,
) -> Result<impl IntoResponse, AppError> {
    let req = req.map(|Json(r)| r).unwrap_or_default();

    let (outcome, rows) = sessions
        .with_session(id, &claims.sub, |s| {
            let mut draft = s.clone();
            for (row_id, answer) in &req.answers {
                draft.select_answer(*row_id, answer)?;
            }
            let outcome = draft.submit(&mut rand::rng())?;
            let rows = draft.take_pending()?;
            *s = draft;
            Ok((outcome, rows))
        })
        .await?;

    tracing::info!(
        "Student {} submitted exam {}: {}/{}",
        claims.sub,
        id,
        outcome.correct_count,
        outcome.total_questions
    );

    let persisted = write_rows(&store, &sessions, id, &claims.sub, rows).await?;

    let message = if persisted {
        "Exam submitted successfully".to_string()
    } else {
        "Exam scored but the result could not be saved yet".to_string()
    };

    Ok(Json(SubmitExamResponse {
        session_id: id,
        outcome,
        persisted,
        message,
    }))
}

/// Retries writing the rows of a submitted exam whose first append failed.
pub async fn persist_exam(
    State(store): State<SharedStore>,
    State(sessions): State<Arc<SessionRegistry>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let rows = sessions
        .with_session(id, &claims.sub, |s| Ok(s.take_pending()?))
        .await?;

    if !write_rows(&store, &sessions, id, &claims.sub, rows).await? {
        return Err(AppError::InternalServerError(format!(
            "Attempt log still not writable for exam {}",
            id
        )));
    }

    let ttl = sessions.ttl_seconds();
    let response = sessions
        .with_session(id, &claims.sub, |s| Ok(ExamResponse::from_session(s, ttl)))
        .await?;

    Ok(Json(response))
}

/// Appends `rows` under the store's write lock.
///
/// On failure the rows go back into the session so a later retry finds them.
async fn write_rows(
    store: &SharedStore,
    sessions: &SessionRegistry,
    id: Uuid,
    student_id: &str,
    rows: Vec<Attempt>,
) -> Result<bool, AppError> {
    let count = rows.len();
    let result = store.write().await.append(rows.clone());

    match result {
        Ok(()) => {
            tracing::debug!("Saved {} attempts for exam {}", count, id);
            // The session may have expired meanwhile; the rows are saved regardless.
            let _ = sessions
                .with_session(id, student_id, |s| {
                    s.mark_persisted();
                    Ok(())
                })
                .await;
            Ok(true)
        }
        Err(e) => {
            tracing::error!("Failed to append attempts for exam {}: {}", id, e);
            // A replaced or expired session cannot take the rows back, but the
            // caller still gets the score.
            if let Err(err) = sessions
                .with_session(id, student_id, |s| {
                    s.restore_pending(rows);
                    Ok(())
                })
                .await
            {
                tracing::warn!("Dropped {} unsaved attempts for exam {}: {}", count, id, err);
            }
            Ok(false)
        }
    }
}
