//! Fakes for the outbound ports, shared by the integration tests.
#![allow(dead_code)]

mod memory;

pub use memory::InMemoryDb;

use api_lib::{
    runtime::{RuntimeSettings, SessionRuntime},
    web::state::AppState,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use study_buddy_core::{
    activity::ActivitySettings,
    domain::{
        Flashcard, PostureLogEntry, PostureStatus, QuizQuestion, QuizResult, Session,
        StoredFlashcard,
    },
    ports::{DatabaseService, PortError, PortResult, PostureSensor, StudyMaterialService},
};
use uuid::Uuid;

//=========================================================================================
// Posture Sensor
//=========================================================================================

/// Returns a fixed angle, or fails when the angle is `None`. An optional delay
/// simulates a slow sensor.
pub struct FakeSensor {
    angle: Mutex<Option<f64>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl FakeSensor {
    pub fn reading(angle: f64) -> Arc<Self> {
        Arc::new(Self {
            angle: Mutex::new(Some(angle)),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            angle: Mutex::new(None),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn slow(angle: f64, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            angle: Mutex::new(Some(angle)),
            delay,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_angle(&self, angle: Option<f64>) {
        *self.angle.lock().unwrap() = angle;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PostureSensor for FakeSensor {
    async fn read_angle(&self) -> PortResult<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let angle = *self.angle.lock().unwrap();
        angle.ok_or_else(|| PortError::Unavailable("connection refused".to_string()))
    }
}

//=========================================================================================
// Study Material
//=========================================================================================

pub enum StudyBehavior {
    Answers,
    Empty,
    Unavailable,
}

pub struct FakeStudy {
    pub behavior: StudyBehavior,
}

impl FakeStudy {
    pub fn new(behavior: StudyBehavior) -> Arc<Self> {
        Arc::new(Self { behavior })
    }
}

pub fn sample_questions() -> Vec<QuizQuestion> {
    vec![
        QuizQuestion {
            question: "What do plants absorb?".to_string(),
            options: vec![
                "Light".to_string(),
                "Sound".to_string(),
                "Heat".to_string(),
                "Noise".to_string(),
            ],
            answer: "Light".to_string(),
        },
        QuizQuestion {
            question: "Where does photosynthesis happen?".to_string(),
            options: vec![
                "Roots".to_string(),
                "Chloroplasts".to_string(),
                "Bark".to_string(),
                "Seeds".to_string(),
            ],
            answer: "Chloroplasts".to_string(),
        },
    ]
}

#[async_trait]
impl StudyMaterialService for FakeStudy {
    async fn generate_flashcards(&self, _document: &str) -> PortResult<Vec<Flashcard>> {
        match self.behavior {
            StudyBehavior::Answers => Ok(vec![
                Flashcard {
                    question: "What is photosynthesis?".to_string(),
                    answer: "Turning light into chemical energy".to_string(),
                },
                Flashcard {
                    question: "Where does it happen?".to_string(),
                    answer: "In chloroplasts".to_string(),
                },
            ]),
            StudyBehavior::Empty => Ok(Vec::new()),
            StudyBehavior::Unavailable => Err(PortError::Unavailable("timeout".to_string())),
        }
    }

    async fn generate_quiz(&self, _document: &str) -> PortResult<Vec<QuizQuestion>> {
        match self.behavior {
            StudyBehavior::Answers => Ok(sample_questions()),
            StudyBehavior::Empty => Ok(Vec::new()),
            StudyBehavior::Unavailable => Err(PortError::Unavailable("timeout".to_string())),
        }
    }

    async fn chat(&self, message: &str) -> PortResult<String> {
        match self.behavior {
            StudyBehavior::Answers => Ok(format!("You asked: {}", message)),
            StudyBehavior::Empty => Ok(String::new()),
            StudyBehavior::Unavailable => Err(PortError::Unavailable("timeout".to_string())),
        }
    }
}

//=========================================================================================
// Database
//=========================================================================================

/// Delegates to `InMemoryDb` but fails every finalize.
#[derive(Default)]
pub struct FinalizeFailsDb {
    inner: InMemoryDb,
}

#[async_trait]
impl DatabaseService for FinalizeFailsDb {
    async fn create_session(&self, title: &str, started_at: DateTime<Utc>) -> PortResult<Session> {
        self.inner.create_session(title, started_at).await
    }

    async fn finalize_session(
        &self,
        _session_id: Uuid,
        _ended_at: DateTime<Utc>,
        _duration_seconds: i64,
    ) -> PortResult<Session> {
        Err(PortError::Unavailable("database is down".to_string()))
    }

    async fn get_session_by_id(&self, session_id: Uuid) -> PortResult<Session> {
        self.inner.get_session_by_id(session_id).await
    }

    async fn list_sessions(&self) -> PortResult<Vec<Session>> {
        self.inner.list_sessions().await
    }

    async fn append_posture_log(
        &self,
        session_id: Uuid,
        angle: f64,
        status: PostureStatus,
    ) -> PortResult<PostureLogEntry> {
        self.inner.append_posture_log(session_id, angle, status).await
    }

    async fn get_posture_logs(&self, session_id: Uuid) -> PortResult<Vec<PostureLogEntry>> {
        self.inner.get_posture_logs(session_id).await
    }

    async fn save_flashcards(
        &self,
        session_id: Uuid,
        cards: &[Flashcard],
    ) -> PortResult<Vec<StoredFlashcard>> {
        self.inner.save_flashcards(session_id, cards).await
    }

    async fn get_flashcards(&self, session_id: Uuid) -> PortResult<Vec<StoredFlashcard>> {
        self.inner.get_flashcards(session_id).await
    }

    async fn upsert_quiz_result(&self, result: &QuizResult) -> PortResult<()> {
        self.inner.upsert_quiz_result(result).await
    }

    async fn get_quiz_result(&self, session_id: Uuid) -> PortResult<Option<QuizResult>> {
        self.inner.get_quiz_result(session_id).await
    }
}

/// Delegates to `InMemoryDb` after sleeping before finalize and posture
/// writes.
pub struct SlowDb {
    inner: InMemoryDb,
    finalize_delay: Duration,
    append_delay: Duration,
}

impl SlowDb {
    pub fn new(finalize_delay: Duration, append_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner: InMemoryDb::new(),
            finalize_delay,
            append_delay,
        })
    }
}

#[async_trait]
impl DatabaseService for SlowDb {
    async fn create_session(&self, title: &str, started_at: DateTime<Utc>) -> PortResult<Session> {
        self.inner.create_session(title, started_at).await
    }

    async fn finalize_session(
        &self,
        session_id: Uuid,
        ended_at: DateTime<Utc>,
        duration_seconds: i64,
    ) -> PortResult<Session> {
        tokio::time::sleep(self.finalize_delay).await;
        self.inner
            .finalize_session(session_id, ended_at, duration_seconds)
            .await
    }

    async fn get_session_by_id(&self, session_id: Uuid) -> PortResult<Session> {
        self.inner.get_session_by_id(session_id).await
    }

    async fn list_sessions(&self) -> PortResult<Vec<Session>> {
        self.inner.list_sessions().await
    }

    async fn append_posture_log(
        &self,
        session_id: Uuid,
        angle: f64,
        status: PostureStatus,
    ) -> PortResult<PostureLogEntry> {
        tokio::time::sleep(self.append_delay).await;
        self.inner.append_posture_log(session_id, angle, status).await
    }

    async fn get_posture_logs(&self, session_id: Uuid) -> PortResult<Vec<PostureLogEntry>> {
        self.inner.get_posture_logs(session_id).await
    }

    async fn save_flashcards(
        &self,
        session_id: Uuid,
        cards: &[Flashcard],
    ) -> PortResult<Vec<StoredFlashcard>> {
        self.inner.save_flashcards(session_id, cards).await
    }

    async fn get_flashcards(&self, session_id: Uuid) -> PortResult<Vec<StoredFlashcard>> {
        self.inner.get_flashcards(session_id).await
    }

    async fn upsert_quiz_result(&self, result: &QuizResult) -> PortResult<()> {
        self.inner.upsert_quiz_result(result).await
    }

    async fn get_quiz_result(&self, session_id: Uuid) -> PortResult<Option<QuizResult>> {
        self.inner.get_quiz_result(session_id).await
    }
}

//=========================================================================================
// Wiring
//=========================================================================================

pub fn runtime_with(db: Arc<dyn DatabaseService>, sensor: Arc<dyn PostureSensor>) -> SessionRuntime {
    SessionRuntime::new(db, sensor, RuntimeSettings::default())
}

pub fn app_state(db: Arc<InMemoryDb>, study: Arc<FakeStudy>) -> Arc<AppState> {
    let runtime = runtime_with(db.clone(), FakeSensor::reading(75.0));
    Arc::new(AppState {
        db,
        study,
        runtime,
        activity: ActivitySettings::default(),
        monitor_check_period: Duration::from_secs(1),
    })
}
