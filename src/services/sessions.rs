// src/services/sessions.rs

use std::collections::HashMap;

use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{error::AppError, services::exam::ExamSession};

/// Live exam sessions keyed by session id.
///
/// A student owns at most one session: opening a new one drops the old.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, ExamSession>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: i64::try_from(ttl_seconds)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::MAX),
        }
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl.num_seconds().max(0) as u64
    }

    fn is_expired(&self, session: &ExamSession) -> bool {
        Utc::now() - session.created_at() > self.ttl
    }

    /// Stores `session`, dropping the owner's previous sessions and any
    /// expired ones.
    pub async fn open(&self, session: ExamSession) -> Uuid {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.student_id() != session.student_id() && !self.is_expired(s));

        let dropped = before - sessions.len();
        if dropped > 0 {
            tracing::debug!("Dropped {} stale exam sessions", dropped);
        }

        let id = session.id();
        sessions.insert(id, session);
        id
    }

    /// Runs `f` against the session if it exists, belongs to `student_id`
    /// and has not expired. Anything else looks like a missing session.
    pub async fn with_session<T>(
        &self,
        id: Uuid,
        student_id: &str,
        f: impl FnOnce(&mut ExamSession) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut sessions = self.sessions.lock().await;

        let expired = match sessions.get(&id) {
            Some(s) if s.student_id() == student_id => self.is_expired(s),
            _ => return Err(AppError::NotFound("Exam session not found".to_string())),
        };
        if expired {
            sessions.remove(&id);
            return Err(AppError::NotFound("Exam session expired".to_string()));
        }

        match sessions.get_mut(&id) {
            Some(session) => f(session),
            None => Err(AppError::NotFound("Exam session not found".to_string())),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}
