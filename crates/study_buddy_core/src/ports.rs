//! crates/study_buddy_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use crate::domain::{
    Flashcard, PostureLogEntry, PostureStatus, QuizQuestion, QuizResult, Session,
    StoredFlashcard,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Upstream service unavailable: {0}")]
    Unavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Session Management ---
    async fn create_session(&self, title: &str, started_at: DateTime<Utc>) -> PortResult<Session>;

    /// Writes end timestamp and duration and marks the session completed.
    async fn finalize_session(
        &self,
        session_id: Uuid,
        ended_at: DateTime<Utc>,
        duration_seconds: i64,
    ) -> PortResult<Session>;

    async fn get_session_by_id(&self, session_id: Uuid) -> PortResult<Session>;

    /// Newest first.
    async fn list_sessions(&self) -> PortResult<Vec<Session>>;

    // --- Posture Logs ---
    /// Appends a reading; the store assigns the timestamp.
    async fn append_posture_log(
        &self,
        session_id: Uuid,
        angle: f64,
        status: PostureStatus,
    ) -> PortResult<PostureLogEntry>;

    async fn get_posture_logs(&self, session_id: Uuid) -> PortResult<Vec<PostureLogEntry>>;

    // --- Study Material ---
    async fn save_flashcards(
        &self,
        session_id: Uuid,
        cards: &[Flashcard],
    ) -> PortResult<Vec<StoredFlashcard>>;

    async fn get_flashcards(&self, session_id: Uuid) -> PortResult<Vec<StoredFlashcard>>;

    /// Replaces any earlier result for the same session.
    async fn upsert_quiz_result(&self, result: &QuizResult) -> PortResult<()>;

    async fn get_quiz_result(&self, session_id: Uuid) -> PortResult<Option<QuizResult>>;
}

#[async_trait]
pub trait StudyMaterialService: Send + Sync {
    /// Generates flashcards from document text. Unparseable output yields an empty list.
    async fn generate_flashcards(&self, document: &str) -> PortResult<Vec<Flashcard>>;

    /// Generates multiple-choice questions from document text.
    async fn generate_quiz(&self, document: &str) -> PortResult<Vec<QuizQuestion>>;

    /// Free-form study chat.
    async fn chat(&self, message: &str) -> PortResult<String>;
}

#[async_trait]
pub trait PostureSensor: Send + Sync {
    /// Fetches the current tilt angle in degrees.
    async fn read_angle(&self) -> PortResult<f64>;
}
