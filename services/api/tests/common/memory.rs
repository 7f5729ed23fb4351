//! An in-process `DatabaseService` so the runtime and router tests need no
//! PostgreSQL instance.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use study_buddy_core::domain::{
    Flashcard, PostureLogEntry, PostureStatus, QuizResult, Session, SessionStatus,
    StoredFlashcard,
};
use study_buddy_core::ports::{DatabaseService, PortError, PortResult};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    sessions: HashMap<Uuid, Session>,
    posture_logs: HashMap<Uuid, Vec<PostureLogEntry>>,
    flashcards: HashMap<Uuid, Vec<StoredFlashcard>>,
    quiz_results: HashMap<Uuid, QuizResult>,
}

#[derive(Default)]
pub struct InMemoryDb {
    inner: Mutex<Collections>,
}

impl InMemoryDb {
    pub fn new() -> Self {
        Self::default()
    }
}

fn session_not_found(session_id: Uuid) -> PortError {
    PortError::NotFound(format!("Session {} not found", session_id))
}

#[async_trait]
impl DatabaseService for InMemoryDb {
    async fn create_session(&self, title: &str, started_at: DateTime<Utc>) -> PortResult<Session> {
        let session = Session {
            id: Uuid::new_v4(),
            title: title.to_string(),
            status: SessionStatus::InProgress,
            started_at,
            ended_at: None,
            duration_seconds: None,
        };
        self.inner
            .lock()
            .await
            .sessions
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn finalize_session(
        &self,
        session_id: Uuid,
        ended_at: DateTime<Utc>,
        duration_seconds: i64,
    ) -> PortResult<Session> {
        let mut inner = self.inner.lock().await;
        let session = inner
            .sessions
            .get_mut(&session_id)
            .ok_or_else(|| session_not_found(session_id))?;
        session.status = SessionStatus::Completed;
        session.ended_at = Some(ended_at);
        session.duration_seconds = Some(duration_seconds);
        Ok(session.clone())
    }

    async fn get_session_by_id(&self, session_id: Uuid) -> PortResult<Session> {
        self.inner
            .lock()
            .await
            .sessions
            .get(&session_id)
            .cloned()
            .ok_or_else(|| session_not_found(session_id))
    }

    async fn list_sessions(&self) -> PortResult<Vec<Session>> {
        let mut sessions: Vec<Session> =
            self.inner.lock().await.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(sessions)
    }

    async fn append_posture_log(
        &self,
        session_id: Uuid,
        angle: f64,
        status: PostureStatus,
    ) -> PortResult<PostureLogEntry> {
        let mut inner = self.inner.lock().await;
        if !inner.sessions.contains_key(&session_id) {
            return Err(session_not_found(session_id));
        }
        let entry = PostureLogEntry {
            id: Uuid::new_v4(),
            session_id,
            angle,
            status,
            recorded_at: Utc::now(),
        };
        inner
            .posture_logs
            .entry(session_id)
            .or_default()
            .push(entry.clone());
        Ok(entry)
    }

    async fn get_posture_logs(&self, session_id: Uuid) -> PortResult<Vec<PostureLogEntry>> {
        Ok(self
            .inner
            .lock()
            .await
            .posture_logs
            .get(&session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_flashcards(
        &self,
        session_id: Uuid,
        cards: &[Flashcard],
    ) -> PortResult<Vec<StoredFlashcard>> {
        let mut inner = self.inner.lock().await;
        if !inner.sessions.contains_key(&session_id) {
            return Err(session_not_found(session_id));
        }
        let created_at = Utc::now();
        let stored: Vec<StoredFlashcard> = cards
            .iter()
            .map(|card| StoredFlashcard {
                id: Uuid::new_v4(),
                session_id,
                card: card.clone(),
                created_at,
            })
            .collect();
        inner
            .flashcards
            .entry(session_id)
            .or_default()
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn get_flashcards(&self, session_id: Uuid) -> PortResult<Vec<StoredFlashcard>> {
        Ok(self
            .inner
            .lock()
            .await
            .flashcards
            .get(&session_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert_quiz_result(&self, result: &QuizResult) -> PortResult<()> {
        let mut inner = self.inner.lock().await;
        if !inner.sessions.contains_key(&result.session_id) {
            return Err(session_not_found(result.session_id));
        }
        inner.quiz_results.insert(result.session_id, result.clone());
        Ok(())
    }

    async fn get_quiz_result(&self, session_id: Uuid) -> PortResult<Option<QuizResult>> {
        Ok(self.inner.lock().await.quiz_results.get(&session_id).cloned())
    }
}
