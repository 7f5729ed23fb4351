pub mod protocol;
pub mod rest;
pub mod state;
pub mod ws_handler;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use rest::{
    chat_handler, configure_timer_handler, generate_flashcards_handler, generate_quiz_handler,
    get_session_handler, get_timer_handler, list_flashcards_handler, list_sessions_handler,
    reset_timer_handler, start_timer_handler, stop_timer_handler, submit_quiz_handler,
    voice_command_handler,
};
use state::AppState;
use std::sync::Arc;

pub use ws_handler::monitor_ws_handler;

/// Builds the API routes. CORS, tracing and Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sessions", get(list_sessions_handler))
        .route("/sessions/{id}", get(get_session_handler))
        .route(
            "/sessions/{id}/flashcards",
            get(list_flashcards_handler).post(generate_flashcards_handler),
        )
        .route("/sessions/{id}/quiz", post(generate_quiz_handler))
        .route("/sessions/{id}/quiz/results", put(submit_quiz_handler))
        .route("/chat", post(chat_handler))
        .route("/timer", get(get_timer_handler))
        .route("/timer/config", put(configure_timer_handler))
        .route("/timer/start", post(start_timer_handler))
        .route("/timer/stop", post(stop_timer_handler))
        .route("/timer/reset", post(reset_timer_handler))
        .route("/voice-commands", post(voice_command_handler))
        .route("/ws/monitor", get(monitor_ws_handler))
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(app_state)
}
