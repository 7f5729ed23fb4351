//! services/api/src/runtime/session.rs
//!
//! The session runtime: owns the countdown timer, the active session record
//! and the background tasks bound to a running session.

use super::RuntimeError;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use study_buddy_core::{
    commands::SessionCommand,
    domain::{PostureLogEntry, Session, SessionStatus},
    ports::{DatabaseService, PortError, PortResult, PostureSensor},
    posture::{SensorConnection, DEFAULT_POSTURE_THRESHOLD_DEGREES},
    timer::{CountdownTimer, Tick, TimerPhase, DEFAULT_MINUTES},
};
use tokio::{
    sync::Mutex,
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    pub default_minutes: u32,
    pub posture_threshold_degrees: f64,
    pub tick_period: Duration,
    pub poll_period: Duration,
    /// Upper bound for a storage call made while the runtime state is locked.
    pub storage_timeout: Duration,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            default_minutes: DEFAULT_MINUTES,
            posture_threshold_degrees: DEFAULT_POSTURE_THRESHOLD_DEGREES,
            tick_period: Duration::from_secs(1),
            poll_period: Duration::from_secs(1),
            storage_timeout: Duration::from_secs(2),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PostureSnapshot {
    pub connection: SensorConnection,
    pub last_entry: Option<PostureLogEntry>,
}

/// A point-in-time copy of the runtime state for the API.
#[derive(Debug, Clone)]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub minutes: u32,
    pub seconds: u32,
    pub remaining_seconds: u32,
    pub title: String,
    pub session: Option<Session>,
    pub posture: PostureSnapshot,
    pub last_error: Option<String>,
}

pub(super) struct RuntimeState {
    pub(super) timer: CountdownTimer,
    pub(super) title: String,
    /// The session of the current run, kept after completion until the next start.
    pub(super) session: Option<Session>,
    pub(super) run_token: Option<CancellationToken>,
    pub(super) posture: PostureSnapshot,
    pub(super) last_error: Option<String>,
}

/// A run that completed in memory and still has to be written to storage.
pub(super) struct CompletedRun {
    session: Session,
    ended_at: DateTime<Utc>,
    duration_seconds: i64,
}

impl RuntimeState {
    fn snapshot(&self) -> TimerSnapshot {
        let (minutes, seconds) = self.timer.configured();
        TimerSnapshot {
            phase: self.timer.phase(),
            minutes,
            seconds,
            remaining_seconds: self.timer.remaining_seconds(),
            title: self.title.clone(),
            session: self.session.clone(),
            posture: self.posture.clone(),
            last_error: self.last_error.clone(),
        }
    }
}

#[derive(Clone)]
pub struct SessionRuntime {
    pub(super) state: Arc<Mutex<RuntimeState>>,
    pub(super) db: Arc<dyn DatabaseService>,
    pub(super) sensor: Arc<dyn PostureSensor>,
    pub(super) settings: RuntimeSettings,
}

impl SessionRuntime {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        sensor: Arc<dyn PostureSensor>,
        settings: RuntimeSettings,
    ) -> Self {
        let state = RuntimeState {
            timer: CountdownTimer::new(settings.default_minutes, 0),
            title: String::new(),
            session: None,
            run_token: None,
            posture: PostureSnapshot::default(),
            last_error: None,
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            db,
            sensor,
            settings,
        }
    }

    pub async fn snapshot(&self) -> TimerSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Changes duration and, when given, the title. Only allowed while idle.
    pub async fn configure(
        &self,
        minutes: u32,
        seconds: u32,
        title: Option<String>,
    ) -> Result<TimerSnapshot, RuntimeError> {
        let mut state = self.state.lock().await;
        state.timer.configure(minutes, seconds)?;
        if let Some(title) = title {
            state.title = title;
        }
        Ok(state.snapshot())
    }

    /// Starts a run and persists a new in-progress session.
    ///
    /// Returns `Ok(None)` without side effects when the timer is already
    /// running, completed, or has nothing left to count down.
    pub async fn start(&self) -> Result<Option<Session>, RuntimeError> {
        let started = {
            let mut state = self.state.lock().await;
            self.start_locked(&mut state).await?
        };
        Ok(started.map(|(session, token)| {
            self.spawn_run(&session, token);
            session
        }))
    }

    /// Ends a running session early. Returns the finalized session, or
    /// `None` when nothing was running.
    pub async fn stop(&self) -> Option<Session> {
        let run = {
            let mut state = self.state.lock().await;
            if !state.timer.is_running() {
                return None;
            }
            info!("Session stopped by user");
            Self::complete_locked(&mut state)?
        };
        Some(self.persist_completion(run).await)
    }

    /// Returns to idle with the configured duration. A running session is
    /// finalized first; earlier session records are kept.
    pub async fn reset(&self) -> TimerSnapshot {
        let run = {
            let mut state = self.state.lock().await;
            let run = if state.timer.is_running() {
                Self::complete_locked(&mut state)
            } else {
                None
            };
            state.timer.reset();
            run
        };
        if let Some(run) = run {
            self.persist_completion(run).await;
        }
        self.snapshot().await
    }

    /// Applies a parsed voice command: configure, then start if requested.
    /// Both steps happen under one lock so no other caller can change the
    /// duration or title in between.
    pub async fn apply_command(&self, command: SessionCommand) -> Result<TimerSnapshot, RuntimeError> {
        let mut state = self.state.lock().await;
        state.timer.configure(command.minutes, command.seconds)?;
        state.title = command.title;
        let started = if command.should_start {
            self.start_locked(&mut state).await?
        } else {
            None
        };
        let snapshot = state.snapshot();
        drop(state);

        if let Some((session, token)) = started {
            self.spawn_run(&session, token);
        }
        Ok(snapshot)
    }

    /// Moves an idle timer to running once the session record exists. The
    /// caller spawns the run's tasks with the returned token after releasing
    /// the lock.
    async fn start_locked(
        &self,
        state: &mut RuntimeState,
    ) -> Result<Option<(Session, CancellationToken)>, RuntimeError> {
        if !state.timer.can_start() {
            debug!(phase = state.timer.phase().as_str(), "Start ignored");
            return Ok(None);
        }

        let created = self
            .bounded_storage(self.db.create_session(&state.title, Utc::now()))
            .await;
        let session = match created {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to create session record: {:?}", e);
                state.last_error = Some(e.to_string());
                return Err(e.into());
            }
        };

        state.timer.start(Instant::now().into_std());
        let token = CancellationToken::new();
        state.run_token = Some(token.clone());
        state.session = Some(session.clone());
        state.posture = PostureSnapshot::default();
        state.last_error = None;
        Ok(Some((session, token)))
    }

    fn spawn_run(&self, session: &Session, token: CancellationToken) {
        info!(session_id = %session.id, title = %session.title, "Session started");
        self.spawn_ticker(token.clone());
        self.spawn_poller(session.id, token);
    }

    /// Runs a storage call that holds the state lock, failing it as
    /// unavailable once `storage_timeout` passes.
    pub(super) async fn bounded_storage<T>(
        &self,
        call: impl Future<Output = PortResult<T>>,
    ) -> PortResult<T> {
        match time::timeout(self.settings.storage_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(PortError::Unavailable(format!(
                "storage call timed out after {:?}",
                self.settings.storage_timeout
            ))),
        }
    }

    fn spawn_ticker(&self, token: CancellationToken) {
        let runtime = self.clone();
        let period = self.settings.tick_period;
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let mut state = runtime.state.lock().await;
                        if token.is_cancelled() {
                            break;
                        }
                        match state.timer.tick() {
                            Tick::Remaining(left) => debug!(remaining = left, "Tick"),
                            Tick::Expired => {
                                info!("Countdown reached zero");
                                let run = Self::complete_locked(&mut state);
                                drop(state);
                                if let Some(run) = run {
                                    runtime.persist_completion(run).await;
                                }
                                break;
                            }
                            Tick::Ignored => break,
                        }
                    }
                }
            }
            debug!("Ticker exited");
        });
    }

    /// Moves a running timer to completed and cancels the run's tasks. The
    /// in-memory session is marked completed at once; writing it to storage
    /// is left to `persist_completion` so the lock is not held across it.
    fn complete_locked(state: &mut RuntimeState) -> Option<CompletedRun> {
        let duration_seconds = state.timer.finish(Instant::now().into_std())?;
        if let Some(token) = state.run_token.take() {
            token.cancel();
        }

        let ended_at = Utc::now();
        let session = Session {
            status: SessionStatus::Completed,
            ended_at: Some(ended_at),
            duration_seconds: Some(duration_seconds),
            ..state.session.clone()?
        };
        info!(session_id = %session.id, duration_seconds, "Session completed");
        state.session = Some(session.clone());
        Some(CompletedRun {
            session,
            ended_at,
            duration_seconds,
        })
    }

    /// Writes the end of a completed run. Storage failures are logged and
    /// surfaced through `last_error`; the in-memory session stays completed.
    async fn persist_completion(&self, run: CompletedRun) -> Session {
        let session_id = run.session.id;
        let result = self
            .db
            .finalize_session(session_id, run.ended_at, run.duration_seconds)
            .await;

        let mut state = self.state.lock().await;
        let current = state.session.as_ref().map(|s| s.id) == Some(session_id);
        match result {
            Ok(saved) => {
                if current {
                    state.session = Some(saved.clone());
                }
                saved
            }
            Err(e) => {
                error!(%session_id, "Failed to finalize session: {:?}", e);
                if current {
                    state.last_error = Some(e.to_string());
                }
                run.session
            }
        }
    }
}
