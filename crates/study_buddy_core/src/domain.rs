//! crates/study_buddy_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Lifecycle status of a study session record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    InProgress,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "in_progress" => Some(SessionStatus::InProgress),
            "completed" => Some(SessionStatus::Completed),
            _ => None,
        }
    }
}

/// One timed study interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: Uuid,
    pub title: String,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    /// Absent while the session is in progress.
    pub ended_at: Option<DateTime<Utc>>,
    /// Whole seconds, absent while the session is in progress.
    pub duration_seconds: Option<i64>,
}

/// Posture bucket derived from a sensor angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostureStatus {
    Good,
    Bad,
}

impl PostureStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostureStatus::Good => "good",
            PostureStatus::Bad => "bad",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "good" => Some(PostureStatus::Good),
            "bad" => Some(PostureStatus::Bad),
            _ => None,
        }
    }
}

/// A single classified posture reading. Appended, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct PostureLogEntry {
    pub id: Uuid,
    pub session_id: Uuid,
    pub angle: f64,
    pub status: PostureStatus,
    /// Assigned by the store when the entry is appended.
    pub recorded_at: DateTime<Utc>,
}

/// A generated question/answer card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flashcard {
    pub question: String,
    pub answer: String,
}

/// A flashcard as persisted under a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFlashcard {
    pub id: Uuid,
    pub session_id: Uuid,
    pub card: Flashcard,
    pub created_at: DateTime<Utc>,
}

/// A multiple-choice question with exactly four options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

/// The graded outcome of a single quiz question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAnswer {
    pub question: String,
    pub selected_answer: Option<String>,
    pub correct_answer: String,
    pub was_correct: bool,
}

/// The single quiz result document kept per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizResult {
    pub session_id: Uuid,
    pub score: usize,
    pub total: usize,
    pub answers: Vec<QuizAnswer>,
}
