//! crates/study_buddy_core/src/posture.rs

use crate::domain::PostureStatus;

pub const DEFAULT_POSTURE_THRESHOLD_DEGREES: f64 = 60.0;

/// Classifies a tilt reading. Angles whose magnitude is at or below the
/// threshold fall in the `Bad` bucket.
pub fn classify_angle(angle: f64, threshold_degrees: f64) -> PostureStatus {
    if angle.abs() <= threshold_degrees {
        PostureStatus::Bad
    } else {
        PostureStatus::Good
    }
}

/// Whether the posture sensor answered on the most recent poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorConnection {
    Connected,
    #[default]
    Disconnected,
}

impl SensorConnection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorConnection::Connected => "connected",
            SensorConnection::Disconnected => "disconnected",
        }
    }
}
