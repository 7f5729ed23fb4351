//! crates/study_buddy_core/src/reminders.rs
//!
//! Elapsed-time watchdogs behind the hydration and break reminders.

use std::time::{Duration, Instant};

/// Compares `now - reference` against a threshold each time it is checked.
///
/// The flag is only raised strictly after the threshold has passed and is
/// always clear while no reference is set.
#[derive(Debug, Clone)]
pub struct Watchdog {
    threshold: Duration,
    reference: Option<Instant>,
    flag: bool,
}

impl Watchdog {
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            reference: None,
            flag: false,
        }
    }

    pub fn threshold(&self) -> Duration {
        self.threshold
    }

    pub fn reference(&self) -> Option<Instant> {
        self.reference
    }

    /// Replaces the reference timestamp. Returns `true` if it changed, in
    /// which case the caller restarts its check schedule.
    pub fn set_reference(&mut self, reference: Option<Instant>) -> bool {
        if self.reference == reference {
            return false;
        }
        self.reference = reference;
        true
    }

    pub fn check(&mut self, now: Instant) -> bool {
        self.flag = match self.reference {
            Some(since) => now.saturating_duration_since(since) > self.threshold,
            None => false,
        };
        self.flag
    }

    pub fn flag(&self) -> bool {
        self.flag
    }
}

/// Tracks the start of uninterrupted face presence.
///
/// A single frame without a face clears the start, so the next run of
/// presence begins counting from zero again.
#[derive(Debug, Default, Clone)]
pub struct PresenceTracker {
    since: Option<Instant>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, face_detected: bool, now: Instant) -> Option<Instant> {
        if face_detected {
            self.since.get_or_insert(now);
        } else {
            self.since = None;
        }
        self.since
    }

    pub fn since(&self) -> Option<Instant> {
        self.since
    }
}
