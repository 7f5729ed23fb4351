//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use study_buddy_core::{
    activity::{ActivitySettings, DEFAULT_BREAK_THRESHOLD, DEFAULT_HYDRATION_THRESHOLD},
    generation::DEFAULT_DOCUMENT_CHAR_LIMIT,
    landmarks::DEFAULT_NEAR_MOUTH_THRESHOLD,
    posture::DEFAULT_POSTURE_THRESHOLD_DEGREES,
    timer::DEFAULT_MINUTES,
};
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub cors_origin: String,
    pub llm_api_key: String,
    pub llm_api_base: Option<String>,
    pub flashcard_model: String,
    pub quiz_model: String,
    pub chat_model: String,
    pub document_char_limit: usize,
    pub posture_url: String,
    pub posture_timeout: Duration,
    pub posture_threshold_degrees: f64,
    pub hydration_reminder: Duration,
    pub break_reminder: Duration,
    pub default_minutes: u32,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server and Database Settings ---
        let bind_address: SocketAddr = parse_var("BIND_ADDRESS", "0.0.0.0:3000".parse().ok())?;
        let database_url = required_var("DATABASE_URL")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;
        let cors_origin = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        // --- LLM Settings ---
        let llm_api_key = required_var("LLM_API_KEY")?;
        let llm_api_base = std::env::var("LLM_API_BASE").ok();
        let flashcard_model =
            std::env::var("FLASHCARD_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let quiz_model = std::env::var("QUIZ_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let chat_model = std::env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let document_char_limit =
            parse_var("DOCUMENT_CHAR_LIMIT", Some(DEFAULT_DOCUMENT_CHAR_LIMIT))?;

        // --- Posture Sensor ---
        let posture_url = required_var("POSTURE_URL")?;
        let posture_timeout = Duration::from_millis(parse_var("POSTURE_TIMEOUT_MS", Some(900u64))?);
        let posture_threshold_degrees = parse_var(
            "POSTURE_THRESHOLD_DEGREES",
            Some(DEFAULT_POSTURE_THRESHOLD_DEGREES),
        )?;

        // --- Reminders and Timer ---
        let hydration_reminder = Duration::from_secs(parse_var(
            "HYDRATION_REMINDER_SECS",
            Some(DEFAULT_HYDRATION_THRESHOLD.as_secs()),
        )?);
        let break_reminder = Duration::from_secs(parse_var(
            "BREAK_REMINDER_SECS",
            Some(DEFAULT_BREAK_THRESHOLD.as_secs()),
        )?);
        let default_minutes = parse_var("DEFAULT_MINUTES", Some(DEFAULT_MINUTES))?;

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            llm_api_key,
            llm_api_base,
            flashcard_model,
            quiz_model,
            chat_model,
            document_char_limit,
            posture_url,
            posture_timeout,
            posture_threshold_degrees,
            hydration_reminder,
            break_reminder,
            default_minutes,
        })
    }

    pub fn activity_settings(&self) -> ActivitySettings {
        ActivitySettings {
            near_mouth_threshold: DEFAULT_NEAR_MOUTH_THRESHOLD,
            hydration_threshold: self.hydration_reminder,
            break_threshold: self.break_reminder,
        }
    }
}

fn required_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

/// Parses an optional variable, falling back to `default` when unset.
fn parse_var<T>(name: &str, default: Option<T>) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => default.ok_or_else(|| ConfigError::MissingVar(name.to_string())),
    }
}
