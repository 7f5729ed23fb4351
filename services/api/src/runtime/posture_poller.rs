//! services/api/src/runtime/posture_poller.rs
//!
//! Polls the posture sensor once per period while a session runs and
//! appends classified readings to the session's log.

use super::session::SessionRuntime;
use study_buddy_core::posture::{classify_angle, SensorConnection};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use uuid::Uuid;

impl SessionRuntime {
    pub(super) fn spawn_poller(&self, session_id: Uuid, token: CancellationToken) {
        let runtime = self.clone();
        let period = self.settings.poll_period;
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => runtime.poll_once(session_id, &token).await,
                }
            }
            debug!(%session_id, "Posture poller exited");
        });
    }

    /// One independent attempt. The sensor request is not aborted by a stop;
    /// instead the running session is re-checked before anything is recorded.
    /// The append stays under the lock so a stop cannot slip in between the
    /// check and the write.
    pub(super) async fn poll_once(&self, session_id: Uuid, token: &CancellationToken) {
        let reading = self.sensor.read_angle().await;

        let mut state = self.state.lock().await;
        let still_running = !token.is_cancelled()
            && state.timer.is_running()
            && state.session.as_ref().map(|s| s.id) == Some(session_id);
        if !still_running {
            debug!(%session_id, "Discarding posture reading for a finished session");
            return;
        }

        match reading {
            Ok(angle) => {
                state.posture.connection = SensorConnection::Connected;
                let status = classify_angle(angle, self.settings.posture_threshold_degrees);
                let appended = self
                    .bounded_storage(self.db.append_posture_log(session_id, angle, status))
                    .await;
                match appended {
                    Ok(entry) => {
                        debug!(angle, status = status.as_str(), "Posture logged");
                        state.posture.last_entry = Some(entry);
                    }
                    Err(e) => {
                        error!(%session_id, "Failed to append posture log: {:?}", e);
                        state.last_error = Some(e.to_string());
                    }
                }
            }
            Err(e) => {
                warn!("Posture sensor unavailable: {}", e);
                state.posture.connection = SensorConnection::Disconnected;
            }
        }
    }
}
