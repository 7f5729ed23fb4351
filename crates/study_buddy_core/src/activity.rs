//! crates/study_buddy_core/src/activity.rs
//!
//! Combines the per-frame drinking heuristic, the detection window and both
//! reminder watchdogs into one single-owner state machine. The service drives
//! it from a frame stream and two 1 Hz schedules.

use crate::detection::DetectionBuffer;
use crate::landmarks::{is_drinking, FrameObservation, DEFAULT_NEAR_MOUTH_THRESHOLD};
use crate::reminders::{PresenceTracker, Watchdog};
use std::time::{Duration, Instant};

pub const DEFAULT_HYDRATION_THRESHOLD: Duration = Duration::from_secs(10);
pub const DEFAULT_BREAK_THRESHOLD: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy)]
pub struct ActivitySettings {
    pub near_mouth_threshold: f32,
    pub hydration_threshold: Duration,
    pub break_threshold: Duration,
}

impl Default for ActivitySettings {
    fn default() -> Self {
        Self {
            near_mouth_threshold: DEFAULT_NEAR_MOUTH_THRESHOLD,
            hydration_threshold: DEFAULT_HYDRATION_THRESHOLD,
            break_threshold: DEFAULT_BREAK_THRESHOLD,
        }
    }
}

/// What a single frame changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameOutcome {
    pub drinking_sample: bool,
    pub detected: bool,
    pub face_present: bool,
    pub hydration_reference_changed: bool,
    pub break_reference_changed: bool,
}

#[derive(Debug)]
pub struct ActivityMonitor {
    settings: ActivitySettings,
    buffer: DetectionBuffer,
    presence: PresenceTracker,
    hydration: Watchdog,
    break_watch: Watchdog,
}

impl ActivityMonitor {
    pub fn new(settings: ActivitySettings) -> Self {
        Self {
            settings,
            buffer: DetectionBuffer::new(),
            presence: PresenceTracker::new(),
            hydration: Watchdog::new(settings.hydration_threshold),
            break_watch: Watchdog::new(settings.break_threshold),
        }
    }

    pub fn observe_frame(&mut self, frame: &FrameObservation, now: Instant) -> FrameOutcome {
        let face_present = frame.face_detected();
        let presence_since = self.presence.observe(face_present, now);
        let break_reference_changed = self.break_watch.set_reference(presence_since);

        let sample = face_present
            && frame.hand_detected()
            && is_drinking(frame, self.settings.near_mouth_threshold);
        let detected = self.buffer.push(sample, now);
        let hydration_reference_changed =
            self.hydration.set_reference(self.buffer.last_detected_at());

        FrameOutcome {
            drinking_sample: sample,
            detected,
            face_present,
            hydration_reference_changed,
            break_reference_changed,
        }
    }

    pub fn check_hydration(&mut self, now: Instant) -> bool {
        self.hydration.check(now)
    }

    pub fn check_break(&mut self, now: Instant) -> bool {
        self.break_watch.check(now)
    }

    pub fn detected(&self) -> bool {
        self.buffer.detected()
    }

    pub fn last_detected_at(&self) -> Option<Instant> {
        self.buffer.last_detected_at()
    }

    pub fn presence_since(&self) -> Option<Instant> {
        self.presence.since()
    }

    pub fn hydration_reminder(&self) -> bool {
        self.hydration.flag()
    }

    pub fn break_reminder(&self) -> bool {
        self.break_watch.flag()
    }
}
