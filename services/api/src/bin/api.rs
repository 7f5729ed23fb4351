//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{DbAdapter, HttpPostureSensor, OpenAiStudyAdapter, StudyModels},
    config::Config,
    error::ApiError,
    runtime::{RuntimeSettings, SessionRuntime},
    web::{rest::ApiDoc, router, state::AppState},
};
use async_openai::{config::OpenAIConfig, Client};
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method,
    },
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database_url)
        .await?;
    let db_adapter = Arc::new(DbAdapter::new(db_pool));
    info!("Running database migrations...");
    db_adapter.run_migrations().await?;
    info!("Database migrations complete.");

    // --- 3. Initialize Service Adapters ---
    let mut openai_config = OpenAIConfig::new().with_api_key(config.llm_api_key.clone());
    if let Some(api_base) = &config.llm_api_base {
        openai_config = openai_config.with_api_base(api_base.clone());
    }
    let openai_client = Client::with_config(openai_config);

    let study_adapter = Arc::new(OpenAiStudyAdapter::new(
        openai_client,
        StudyModels {
            flashcards: config.flashcard_model.clone(),
            quiz: config.quiz_model.clone(),
            chat: config.chat_model.clone(),
        },
        config.document_char_limit,
    ));

    let posture_sensor = Arc::new(HttpPostureSensor::new(
        config.posture_url.clone(),
        config.posture_timeout,
    )?);

    // --- 4. Build the Session Runtime & Shared AppState ---
    let runtime = SessionRuntime::new(
        db_adapter.clone(),
        posture_sensor,
        RuntimeSettings {
            default_minutes: config.default_minutes,
            posture_threshold_degrees: config.posture_threshold_degrees,
            ..RuntimeSettings::default()
        },
    );

    let app_state = Arc::new(AppState {
        db: db_adapter,
        study: study_adapter,
        runtime,
        activity: config.activity_settings(),
        monitor_check_period: Duration::from_secs(1),
    });

    // --- 5. Create the Web Router ---
    let origin = config.cors_origin.parse::<HeaderValue>().map_err(|_| {
        ApiError::Internal(format!("Invalid CORS_ORIGIN '{}'", config.cors_origin))
    })?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, ACCEPT]);

    let app = Router::new()
        .merge(router(app_state))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // --- 6. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
