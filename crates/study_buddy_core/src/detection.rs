//! crates/study_buddy_core/src/detection.rs
//!
//! Debounces the noisy per-frame drinking signal with a majority vote over
//! the most recent frames.

use std::collections::VecDeque;
use std::time::Instant;

/// Number of recent frames kept in the window.
pub const WINDOW_CAPACITY: usize = 5;

/// Minimum number of positive frames in the window to report a detection.
pub const DETECTION_THRESHOLD: usize = 3;

/// Fixed-capacity FIFO of per-frame samples.
#[derive(Debug)]
pub struct DetectionBuffer {
    window: VecDeque<bool>,
    detected: bool,
    last_detected_at: Option<Instant>,
}

impl Default for DetectionBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl DetectionBuffer {
    pub fn new() -> Self {
        Self {
            window: VecDeque::with_capacity(WINDOW_CAPACITY + 1),
            detected: false,
            last_detected_at: None,
        }
    }

    /// Inserts one sample and recomputes the detection state from the whole
    /// window. Every push that leaves the window at or above the threshold
    /// refreshes `last_detected_at`, not only the first one.
    pub fn push(&mut self, sample: bool, now: Instant) -> bool {
        self.window.push_back(sample);
        if self.window.len() > WINDOW_CAPACITY {
            self.window.pop_front();
        }

        let positives = self.window.iter().filter(|&&s| s).count();
        self.detected = positives >= DETECTION_THRESHOLD;
        if self.detected {
            self.last_detected_at = Some(now);
        }
        self.detected
    }

    pub fn detected(&self) -> bool {
        self.detected
    }

    pub fn last_detected_at(&self) -> Option<Instant> {
        self.last_detected_at
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}
