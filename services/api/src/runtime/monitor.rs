//! services/api/src/runtime/monitor.rs
//!
//! Runs the drinking/break detection for one client. Frames arrive on a
//! channel and a single task owns the detection window, the presence start
//! and both watchdogs; the current state is published on a watch channel.

use chrono::{DateTime, Utc};
use std::time::Duration;
use study_buddy_core::{
    activity::{ActivityMonitor, ActivitySettings},
    landmarks::FrameObservation,
};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{self, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Frames are dropped rather than queued when the monitor falls behind.
const FRAME_QUEUE_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub enum MonitorInput {
    Frame(FrameObservation),
    /// The client could not access its camera or load the landmark models.
    CameraError(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorSnapshot {
    pub detected: bool,
    pub face_present: bool,
    pub last_detected_at: Option<DateTime<Utc>>,
    pub hydration_reminder: bool,
    pub break_reminder: bool,
    pub camera_error: Option<String>,
}

/// Owns the monitor task. Dropping the handle stops the task.
pub struct MonitorHandle {
    inputs: mpsc::Sender<MonitorInput>,
    snapshots: watch::Receiver<MonitorSnapshot>,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn spawn(settings: ActivitySettings, check_period: Duration) -> Self {
        let (inputs, rx) = mpsc::channel(FRAME_QUEUE_CAPACITY);
        let (tx, snapshots) = watch::channel(MonitorSnapshot::default());
        let token = CancellationToken::new();
        let task = tokio::spawn(run_monitor(settings, check_period, rx, tx, token.clone()));
        Self {
            inputs,
            snapshots,
            token,
            task,
        }
    }

    /// Queues an input without waiting. Returns `false` if it was dropped.
    pub fn submit(&self, input: MonitorInput) -> bool {
        match self.inputs.try_send(input) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                debug!("Monitor queue full, dropping input");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Queues an input, waiting for room in the queue.
    pub async fn send(&self, input: MonitorInput) -> bool {
        self.inputs.send(input).await.is_ok()
    }

    pub fn subscribe(&self) -> watch::Receiver<MonitorSnapshot> {
        self.snapshots.clone()
    }

    pub fn current(&self) -> MonitorSnapshot {
        self.snapshots.borrow().clone()
    }

    pub async fn shutdown(mut self) {
        self.token.cancel();
        let _ = (&mut self.task).await;
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run_monitor(
    settings: ActivitySettings,
    check_period: Duration,
    mut inputs: mpsc::Receiver<MonitorInput>,
    snapshots: watch::Sender<MonitorSnapshot>,
    token: CancellationToken,
) {
    let mut monitor = ActivityMonitor::new(settings);
    let mut hydration_check = time::interval_at(Instant::now() + check_period, check_period);
    let mut break_check = time::interval_at(Instant::now() + check_period, check_period);
    let mut snapshot = MonitorSnapshot::default();

    info!("Activity monitor started");
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            input = inputs.recv() => {
                let Some(input) = input else { break };
                match input {
                    MonitorInput::Frame(frame) => {
                        let now = Instant::now().into_std();
                        let outcome = monitor.observe_frame(&frame, now);
                        snapshot.detected = outcome.detected;
                        snapshot.face_present = outcome.face_present;
                        if outcome.detected {
                            snapshot.last_detected_at = Some(Utc::now());
                        }
                        // A new reference restarts that watchdog's schedule.
                        if outcome.hydration_reference_changed {
                            hydration_check.reset();
                            snapshot.hydration_reminder = monitor.check_hydration(now);
                        }
                        if outcome.break_reference_changed {
                            break_check.reset();
                            snapshot.break_reminder = monitor.check_break(now);
                        }
                    }
                    MonitorInput::CameraError(message) => {
                        warn!("Client camera error: {}", message);
                        snapshot.camera_error = Some(message);
                    }
                }
            }
            _ = hydration_check.tick() => {
                snapshot.hydration_reminder = monitor.check_hydration(Instant::now().into_std());
            }
            _ = break_check.tick() => {
                snapshot.break_reminder = monitor.check_break(Instant::now().into_std());
            }
        }

        snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot.clone();
                true
            }
        });
    }
    info!("Activity monitor stopped");
}
