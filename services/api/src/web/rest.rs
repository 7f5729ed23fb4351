//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::{
    runtime::{RuntimeError, TimerSnapshot},
    web::state::AppState,
};
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_buddy_core::{
    commands::parse_command,
    domain::{PostureLogEntry, QuizQuestion, QuizResult, Session, StoredFlashcard},
    ports::PortError,
    quiz::grade_quiz,
    timer::TimerError,
};
use tracing::{error, info, warn};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// Reply used when the chat model cannot be reached.
pub const CHAT_FALLBACK_REPLY: &str = "No response.";

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_sessions_handler,
        get_session_handler,
        list_flashcards_handler,
        generate_flashcards_handler,
        generate_quiz_handler,
        submit_quiz_handler,
        chat_handler,
        get_timer_handler,
        configure_timer_handler,
        start_timer_handler,
        stop_timer_handler,
        reset_timer_handler,
        voice_command_handler,
    ),
    components(
        schemas(
            SessionResponse,
            SessionDetailResponse,
            PostureLogResponse,
            FlashcardResponse,
            FlashcardsResponse,
            QuizQuestionDto,
            QuizResponse,
            SubmitQuizRequest,
            QuizAnswerResponse,
            QuizResultResponse,
            GenerationStatus,
            ChatRequest,
            ChatResponse,
            TimerResponse,
            ConfigureTimerRequest,
            VoiceCommandRequest,
            VoiceCommandResponse,
            ParsedCommand,
        )
    ),
    tags(
        (name = "StudyBuddy API", description = "Study session timer, posture log, study material and session history.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub title: String,
    /// `in_progress` or `completed`.
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            title: session.title,
            status: session.status.as_str().to_string(),
            started_at: session.started_at,
            ended_at: session.ended_at,
            duration_seconds: session.duration_seconds,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PostureLogResponse {
    pub id: Uuid,
    pub angle: f64,
    /// `good` or `bad`.
    pub status: String,
    pub recorded_at: DateTime<Utc>,
}

impl From<PostureLogEntry> for PostureLogResponse {
    fn from(entry: PostureLogEntry) -> Self {
        Self {
            id: entry.id,
            angle: entry.angle,
            status: entry.status.as_str().to_string(),
            recorded_at: entry.recorded_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct FlashcardResponse {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl From<StoredFlashcard> for FlashcardResponse {
    fn from(stored: StoredFlashcard) -> Self {
        Self {
            id: stored.id,
            question: stored.card.question,
            answer: stored.card.answer,
            created_at: stored.created_at,
        }
    }
}

/// Outcome of a generation request.
#[derive(Serialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Ok,
    /// The model answered but nothing usable could be parsed.
    Empty,
    /// The model could not be reached.
    Unavailable,
}

#[derive(Serialize, ToSchema)]
pub struct FlashcardsResponse {
    pub status: GenerationStatus,
    pub flashcards: Vec<FlashcardResponse>,
}

#[derive(Serialize, Deserialize, ToSchema, Clone)]
pub struct QuizQuestionDto {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

impl From<QuizQuestion> for QuizQuestionDto {
    fn from(question: QuizQuestion) -> Self {
        Self {
            question: question.question,
            options: question.options,
            answer: question.answer,
        }
    }
}

impl From<QuizQuestionDto> for QuizQuestion {
    fn from(dto: QuizQuestionDto) -> Self {
        Self {
            question: dto.question,
            options: dto.options,
            answer: dto.answer,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct QuizResponse {
    pub status: GenerationStatus,
    pub questions: Vec<QuizQuestionDto>,
}

/// The questions as they were shown, and the option picked for each one
/// (`null` when unanswered). Missing trailing selections count as unanswered.
#[derive(Deserialize, ToSchema)]
pub struct SubmitQuizRequest {
    pub questions: Vec<QuizQuestionDto>,
    #[serde(default)]
    pub selected: Vec<Option<String>>,
}

#[derive(Serialize, ToSchema)]
pub struct QuizAnswerResponse {
    pub question: String,
    pub selected_answer: Option<String>,
    pub correct_answer: String,
    pub was_correct: bool,
}

#[derive(Serialize, ToSchema)]
pub struct QuizResultResponse {
    pub session_id: Uuid,
    pub score: usize,
    pub total: usize,
    pub answers: Vec<QuizAnswerResponse>,
}

impl From<QuizResult> for QuizResultResponse {
    fn from(result: QuizResult) -> Self {
        Self {
            session_id: result.session_id,
            score: result.score,
            total: result.total,
            answers: result
                .answers
                .into_iter()
                .map(|a| QuizAnswerResponse {
                    question: a.question,
                    selected_answer: a.selected_answer,
                    correct_answer: a.correct_answer,
                    was_correct: a.was_correct,
                })
                .collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SessionDetailResponse {
    pub session: SessionResponse,
    pub posture_logs: Vec<PostureLogResponse>,
    pub flashcards: Vec<FlashcardResponse>,
    pub quiz_result: Option<QuizResultResponse>,
}

#[derive(Deserialize, ToSchema)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ChatResponse {
    pub reply: String,
    pub status: GenerationStatus,
}

#[derive(Serialize, ToSchema)]
pub struct TimerResponse {
    /// `idle`, `running` or `completed`.
    pub phase: String,
    pub minutes: u32,
    pub seconds: u32,
    pub remaining_seconds: u32,
    pub title: String,
    /// The session of the current or most recent run.
    pub session: Option<SessionResponse>,
    /// `connected` or `disconnected`.
    pub posture_connection: String,
    pub last_posture: Option<PostureLogResponse>,
    /// The last storage failure of the current run, if any.
    pub last_error: Option<String>,
}

impl From<TimerSnapshot> for TimerResponse {
    fn from(snapshot: TimerSnapshot) -> Self {
        Self {
            phase: snapshot.phase.as_str().to_string(),
            minutes: snapshot.minutes,
            seconds: snapshot.seconds,
            remaining_seconds: snapshot.remaining_seconds,
            title: snapshot.title,
            session: snapshot.session.map(SessionResponse::from),
            posture_connection: snapshot.posture.connection.as_str().to_string(),
            last_posture: snapshot.posture.last_entry.map(PostureLogResponse::from),
            last_error: snapshot.last_error,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct ConfigureTimerRequest {
    pub minutes: u32,
    #[serde(default)]
    pub seconds: u32,
    pub title: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct VoiceCommandRequest {
    pub utterance: String,
}

#[derive(Serialize, ToSchema)]
pub struct ParsedCommand {
    pub title: String,
    pub minutes: u32,
    pub seconds: u32,
    pub should_start: bool,
}

#[derive(Serialize, ToSchema)]
pub struct VoiceCommandResponse {
    pub command: ParsedCommand,
    pub timer: TimerResponse,
}

//=========================================================================================
// Error Mapping Helpers
//=========================================================================================

fn port_error(context: &str, e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        other => {
            error!("{}: {:?}", context, other);
            (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
        }
    }
}

fn runtime_error(e: RuntimeError) -> (StatusCode, String) {
    match e {
        RuntimeError::Timer(TimerError::NotIdle) => (
            StatusCode::CONFLICT,
            "The timer must be idle; reset it first".to_string(),
        ),
        RuntimeError::Port(e) => port_error("Failed to create session record", e),
    }
}

/// Reads the first part of a multipart upload as UTF-8 document text.
async fn read_document(multipart: &mut Multipart) -> Result<String, (StatusCode, String)> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                format!("Failed to read multipart data: {}", e),
            )
        })?
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                "Multipart form must include a document".to_string(),
            )
        })?;

    let data = field.bytes().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read document bytes: {}", e),
        )
    })?;
    let text = String::from_utf8(data.to_vec()).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Uploaded document is not valid UTF-8 text: {}", e),
        )
    })?;

    if text.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Uploaded document is empty".to_string()));
    }
    Ok(text)
}

//=========================================================================================
// Session History Handlers
//=========================================================================================

/// List all study sessions, newest first.
#[utoipa::path(
    get,
    path = "/sessions",
    responses(
        (status = 200, description = "All sessions", body = [SessionResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_sessions_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let sessions = app_state
        .db
        .list_sessions()
        .await
        .map_err(|e| port_error("Failed to list sessions", e))?;
    let body: Vec<SessionResponse> = sessions.into_iter().map(SessionResponse::from).collect();
    Ok(Json(body))
}

/// Get one session with its posture log, flashcards and quiz result.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = Uuid, Path, description = "The session ID.")),
    responses(
        (status = 200, description = "Session detail", body = SessionDetailResponse),
        (status = 404, description = "Unknown session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn get_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let db = &app_state.db;
    let session = db
        .get_session_by_id(session_id)
        .await
        .map_err(|e| port_error("Failed to load session", e))?;

    let result = async {
        let logs = db.get_posture_logs(session_id).await?;
        let cards = db.get_flashcards(session_id).await?;
        let quiz = db.get_quiz_result(session_id).await?;
        Ok::<_, PortError>((logs, cards, quiz))
    }
    .await;
    let (logs, cards, quiz) = result.map_err(|e| port_error("Failed to load session detail", e))?;

    Ok(Json(SessionDetailResponse {
        session: session.into(),
        posture_logs: logs.into_iter().map(PostureLogResponse::from).collect(),
        flashcards: cards.into_iter().map(FlashcardResponse::from).collect(),
        quiz_result: quiz.map(QuizResultResponse::from),
    }))
}

//=========================================================================================
// Study Material Handlers
//=========================================================================================

/// List the flashcards stored for a session.
#[utoipa::path(
    get,
    path = "/sessions/{id}/flashcards",
    params(("id" = Uuid, Path, description = "The session ID.")),
    responses(
        (status = 200, description = "Stored flashcards in creation order", body = [FlashcardResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_flashcards_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let cards = app_state
        .db
        .get_flashcards(session_id)
        .await
        .map_err(|e| port_error("Failed to load flashcards", e))?;
    let body: Vec<FlashcardResponse> = cards.into_iter().map(FlashcardResponse::from).collect();
    Ok(Json(body))
}

/// Generate flashcards from an uploaded document and store them under the session.
#[utoipa::path(
    post,
    path = "/sessions/{id}/flashcards",
    params(("id" = Uuid, Path, description = "The session ID.")),
    request_body(content_type = "multipart/form-data", description = "The document text to study."),
    responses(
        (status = 201, description = "Flashcards generated and stored", body = FlashcardsResponse),
        (status = 400, description = "Missing or unreadable document"),
        (status = 404, description = "Unknown session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn generate_flashcards_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state
        .db
        .get_session_by_id(session_id)
        .await
        .map_err(|e| port_error("Failed to load session", e))?;
    let document = read_document(&mut multipart).await?;

    let (status, cards) = match app_state.study.generate_flashcards(&document).await {
        Ok(cards) if cards.is_empty() => (GenerationStatus::Empty, cards),
        Ok(cards) => (GenerationStatus::Ok, cards),
        Err(e) => {
            warn!("Flashcard generation failed: {}", e);
            (GenerationStatus::Unavailable, Vec::new())
        }
    };

    let stored = if cards.is_empty() {
        Vec::new()
    } else {
        app_state
            .db
            .save_flashcards(session_id, &cards)
            .await
            .map_err(|e| port_error("Failed to save flashcards", e))?
    };
    info!(%session_id, count = stored.len(), "Flashcards stored");

    let response = FlashcardsResponse {
        status,
        flashcards: stored.into_iter().map(FlashcardResponse::from).collect(),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Generate multiple-choice questions from an uploaded document.
#[utoipa::path(
    post,
    path = "/sessions/{id}/quiz",
    params(("id" = Uuid, Path, description = "The session ID.")),
    request_body(content_type = "multipart/form-data", description = "The document text to study."),
    responses(
        (status = 200, description = "Generated questions", body = QuizResponse),
        (status = 400, description = "Missing or unreadable document"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn generate_quiz_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state
        .db
        .get_session_by_id(session_id)
        .await
        .map_err(|e| port_error("Failed to load session", e))?;
    let document = read_document(&mut multipart).await?;

    let response = match app_state.study.generate_quiz(&document).await {
        Ok(questions) => QuizResponse {
            status: if questions.is_empty() {
                GenerationStatus::Empty
            } else {
                GenerationStatus::Ok
            },
            questions: questions.into_iter().map(QuizQuestionDto::from).collect(),
        },
        Err(e) => {
            warn!("Quiz generation failed: {}", e);
            QuizResponse {
                status: GenerationStatus::Unavailable,
                questions: Vec::new(),
            }
        }
    };
    Ok(Json(response))
}

/// Grade submitted answers and store the result, replacing any earlier one.
#[utoipa::path(
    put,
    path = "/sessions/{id}/quiz/results",
    params(("id" = Uuid, Path, description = "The session ID.")),
    request_body = SubmitQuizRequest,
    responses(
        (status = 200, description = "Graded and stored result", body = QuizResultResponse),
        (status = 404, description = "Unknown session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn submit_quiz_handler(
    State(app_state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state
        .db
        .get_session_by_id(session_id)
        .await
        .map_err(|e| port_error("Failed to load session", e))?;

    let questions: Vec<QuizQuestion> = payload.questions.into_iter().map(QuizQuestion::from).collect();
    let result = grade_quiz(session_id, &questions, &payload.selected);
    app_state
        .db
        .upsert_quiz_result(&result)
        .await
        .map_err(|e| port_error("Failed to save quiz result", e))?;
    info!(%session_id, score = result.score, total = result.total, "Quiz graded");

    Ok(Json(QuizResultResponse::from(result)))
}

/// Ask the study assistant a free-form question.
#[utoipa::path(
    post,
    path = "/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "The assistant's reply", body = ChatResponse),
        (status = 400, description = "Empty message")
    )
)]
pub async fn chat_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Message must not be empty".to_string()));
    }

    let response = match app_state.study.chat(message).await {
        Ok(reply) if !reply.is_empty() => ChatResponse {
            reply,
            status: GenerationStatus::Ok,
        },
        Ok(_) => ChatResponse {
            reply: CHAT_FALLBACK_REPLY.to_string(),
            status: GenerationStatus::Empty,
        },
        Err(e) => {
            warn!("Chat request failed: {}", e);
            ChatResponse {
                reply: CHAT_FALLBACK_REPLY.to_string(),
                status: GenerationStatus::Unavailable,
            }
        }
    };
    Ok(Json(response))
}

//=========================================================================================
// Timer Handlers
//=========================================================================================

/// Get the current timer, session and posture state.
#[utoipa::path(
    get,
    path = "/timer",
    responses((status = 200, description = "Current timer state", body = TimerResponse))
)]
pub async fn get_timer_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(TimerResponse::from(app_state.runtime.snapshot().await))
}

/// Set the session duration and title. Only allowed while the timer is idle.
#[utoipa::path(
    put,
    path = "/timer/config",
    request_body = ConfigureTimerRequest,
    responses(
        (status = 200, description = "Updated timer state", body = TimerResponse),
        (status = 409, description = "Timer is not idle")
    )
)]
pub async fn configure_timer_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<ConfigureTimerRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let snapshot = app_state
        .runtime
        .configure(payload.minutes, payload.seconds, payload.title)
        .await
        .map_err(runtime_error)?;
    Ok(Json(TimerResponse::from(snapshot)))
}

/// Start the countdown and create a session record.
///
/// Starting while running, after completion, or with no time left changes nothing.
#[utoipa::path(
    post,
    path = "/timer/start",
    responses(
        (status = 200, description = "Timer state after the request", body = TimerResponse),
        (status = 500, description = "The session record could not be created")
    )
)]
pub async fn start_timer_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    app_state.runtime.start().await.map_err(runtime_error)?;
    Ok(Json(TimerResponse::from(app_state.runtime.snapshot().await)))
}

/// End the running session early.
#[utoipa::path(
    post,
    path = "/timer/stop",
    responses((status = 200, description = "Timer state after the request", body = TimerResponse))
)]
pub async fn stop_timer_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    app_state.runtime.stop().await;
    Json(TimerResponse::from(app_state.runtime.snapshot().await))
}

/// Return to idle with the configured duration.
#[utoipa::path(
    post,
    path = "/timer/reset",
    responses((status = 200, description = "Timer state after the reset", body = TimerResponse))
)]
pub async fn reset_timer_handler(State(app_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(TimerResponse::from(app_state.runtime.reset().await))
}

/// Apply a spoken command such as "start session biology for 30 minutes".
#[utoipa::path(
    post,
    path = "/voice-commands",
    request_body = VoiceCommandRequest,
    responses(
        (status = 200, description = "Parsed command and resulting timer state", body = VoiceCommandResponse),
        (status = 409, description = "Timer is not idle")
    )
)]
pub async fn voice_command_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<VoiceCommandRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let command = parse_command(&payload.utterance);
    info!(
        title = %command.title,
        minutes = command.minutes,
        seconds = command.seconds,
        start = command.should_start,
        "Voice command parsed"
    );

    let parsed = ParsedCommand {
        title: command.title.clone(),
        minutes: command.minutes,
        seconds: command.seconds,
        should_start: command.should_start,
    };
    let snapshot = app_state
        .runtime
        .apply_command(command)
        .await
        .map_err(runtime_error)?;

    Ok(Json(VoiceCommandResponse {
        command: parsed,
        timer: snapshot.into(),
    }))
}
