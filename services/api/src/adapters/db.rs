//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use study_buddy_core::domain::{
    Flashcard, PostureLogEntry, PostureStatus, QuizAnswer, QuizResult, Session, SessionStatus,
    StoredFlashcard,
};
use study_buddy_core::ports::{DatabaseService, PortError, PortResult};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(e: sqlx::Error, what: String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        other => PortError::Unexpected(other.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    title: String,
    status: String,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    duration_seconds: Option<i64>,
}
impl SessionRecord {
    fn to_domain(self) -> PortResult<Session> {
        let status = SessionStatus::parse(&self.status).ok_or_else(|| {
            PortError::Unexpected(format!("Unknown session status '{}'", self.status))
        })?;
        Ok(Session {
            id: self.id,
            title: self.title,
            status,
            started_at: self.started_at,
            ended_at: self.ended_at,
            duration_seconds: self.duration_seconds,
        })
    }
}

#[derive(FromRow)]
struct PostureLogRecord {
    id: Uuid,
    session_id: Uuid,
    angle: f64,
    status: String,
    recorded_at: DateTime<Utc>,
}
impl PostureLogRecord {
    fn to_domain(self) -> PortResult<PostureLogEntry> {
        let status = PostureStatus::parse(&self.status).ok_or_else(|| {
            PortError::Unexpected(format!("Unknown posture status '{}'", self.status))
        })?;
        Ok(PostureLogEntry {
            id: self.id,
            session_id: self.session_id,
            angle: self.angle,
            status,
            recorded_at: self.recorded_at,
        })
    }
}

#[derive(FromRow)]
struct FlashcardRecord {
    id: Uuid,
    session_id: Uuid,
    question: String,
    answer: String,
    created_at: DateTime<Utc>,
}
impl FlashcardRecord {
    fn to_domain(self) -> StoredFlashcard {
        StoredFlashcard {
            id: self.id,
            session_id: self.session_id,
            card: Flashcard {
                question: self.question,
                answer: self.answer,
            },
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct QuizResultRecord {
    session_id: Uuid,
    score: i32,
    total: i32,
}

#[derive(FromRow)]
struct QuizAnswerRecord {
    question: String,
    selected_answer: Option<String>,
    correct_answer: String,
    was_correct: bool,
}
impl QuizAnswerRecord {
    fn to_domain(self) -> QuizAnswer {
        QuizAnswer {
            question: self.question,
            selected_answer: self.selected_answer,
            correct_answer: self.correct_answer,
            was_correct: self.was_correct,
        }
    }
}

const SESSION_COLUMNS: &str = "id, title, status, started_at, ended_at, duration_seconds";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_session(&self, title: &str, started_at: DateTime<Utc>) -> PortResult<Session> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "INSERT INTO sessions (id, title, status, started_at) VALUES ($1, $2, $3, $4) RETURNING {SESSION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(SessionStatus::InProgress.as_str())
        .bind(started_at)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn finalize_session(
        &self,
        session_id: Uuid,
        ended_at: DateTime<Utc>,
        duration_seconds: i64,
    ) -> PortResult<Session> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "UPDATE sessions SET status = $1, ended_at = $2, duration_seconds = $3 WHERE id = $4 RETURNING {SESSION_COLUMNS}"
        ))
        .bind(SessionStatus::Completed.as_str())
        .bind(ended_at)
        .bind(duration_seconds)
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Session {} not found", session_id)))?;
        record.to_domain()
    }

    async fn get_session_by_id(&self, session_id: Uuid) -> PortResult<Session> {
        let record = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1"
        ))
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or_unexpected(e, format!("Session {} not found", session_id)))?;
        record.to_domain()
    }

    async fn list_sessions(&self) -> PortResult<Vec<Session>> {
        let records = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions ORDER BY started_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(SessionRecord::to_domain).collect()
    }

    async fn append_posture_log(
        &self,
        session_id: Uuid,
        angle: f64,
        status: PostureStatus,
    ) -> PortResult<PostureLogEntry> {
        let record = sqlx::query_as::<_, PostureLogRecord>(
            "INSERT INTO posture_logs (id, session_id, angle, status) VALUES ($1, $2, $3, $4) \
             RETURNING id, session_id, angle, status, recorded_at",
        )
        .bind(Uuid::new_v4())
        .bind(session_id)
        .bind(angle)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_posture_logs(&self, session_id: Uuid) -> PortResult<Vec<PostureLogEntry>> {
        let records = sqlx::query_as::<_, PostureLogRecord>(
            "SELECT id, session_id, angle, status, recorded_at FROM posture_logs WHERE session_id = $1 ORDER BY seq ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(PostureLogRecord::to_domain).collect()
    }

    async fn save_flashcards(
        &self,
        session_id: Uuid,
        cards: &[Flashcard],
    ) -> PortResult<Vec<StoredFlashcard>> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;
        let mut stored = Vec::with_capacity(cards.len());
        for card in cards {
            let record = sqlx::query_as::<_, FlashcardRecord>(
                "INSERT INTO flashcards (id, session_id, question, answer) VALUES ($1, $2, $3, $4) \
                 RETURNING id, session_id, question, answer, created_at",
            )
            .bind(Uuid::new_v4())
            .bind(session_id)
            .bind(&card.question)
            .bind(&card.answer)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;
            stored.push(record.to_domain());
        }
        tx.commit().await.map_err(unexpected)?;
        Ok(stored)
    }

    async fn get_flashcards(&self, session_id: Uuid) -> PortResult<Vec<StoredFlashcard>> {
        let records = sqlx::query_as::<_, FlashcardRecord>(
            "SELECT id, session_id, question, answer, created_at FROM flashcards WHERE session_id = $1 ORDER BY seq ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(FlashcardRecord::to_domain).collect())
    }

    async fn upsert_quiz_result(&self, result: &QuizResult) -> PortResult<()> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        sqlx::query(
            "INSERT INTO quiz_results (session_id, score, total) VALUES ($1, $2, $3) \
             ON CONFLICT (session_id) DO UPDATE SET score = EXCLUDED.score, total = EXCLUDED.total, updated_at = now()",
        )
        .bind(result.session_id)
        .bind(result.score as i32)
        .bind(result.total as i32)
        .execute(&mut *tx)
        .await
        .map_err(unexpected)?;

        sqlx::query("DELETE FROM quiz_answers WHERE session_id = $1")
            .bind(result.session_id)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;

        for (position, answer) in result.answers.iter().enumerate() {
            sqlx::query(
                "INSERT INTO quiz_answers (session_id, position, question, selected_answer, correct_answer, was_correct) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(result.session_id)
            .bind(position as i32)
            .bind(&answer.question)
            .bind(&answer.selected_answer)
            .bind(&answer.correct_answer)
            .bind(answer.was_correct)
            .execute(&mut *tx)
            .await
            .map_err(unexpected)?;
        }

        tx.commit().await.map_err(unexpected)?;
        Ok(())
    }

    async fn get_quiz_result(&self, session_id: Uuid) -> PortResult<Option<QuizResult>> {
        let Some(header) = sqlx::query_as::<_, QuizResultRecord>(
            "SELECT session_id, score, total FROM quiz_results WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        else {
            return Ok(None);
        };

        let answers = sqlx::query_as::<_, QuizAnswerRecord>(
            "SELECT question, selected_answer, correct_answer, was_correct FROM quiz_answers \
             WHERE session_id = $1 ORDER BY position ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(Some(QuizResult {
            session_id: header.session_id,
            score: header.score.max(0) as usize,
            total: header.total.max(0) as usize,
            answers: answers.into_iter().map(QuizAnswerRecord::to_domain).collect(),
        }))
    }
}
