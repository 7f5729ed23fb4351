//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the
//! activity monitor. The browser runs the landmark models and sends only the
//! resulting points; the server answers with monitor snapshots.

use crate::runtime::MonitorSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use study_buddy_core::landmarks::{FrameObservation, Point3};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// A single landmark. A missing `z` counts as zero depth.
#[derive(Deserialize, Debug, Clone, Copy)]
pub struct LandmarkPoint {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: Option<f32>,
}

impl From<LandmarkPoint> for Point3 {
    fn from(point: LandmarkPoint) -> Self {
        Point3::new(point.x, point.y, point.z.unwrap_or(0.0))
    }
}

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Landmarks of the first detected face and hand in one video frame.
    /// Either is omitted or null when nothing was detected.
    Frame {
        #[serde(default)]
        face: Option<Vec<LandmarkPoint>>,
        #[serde(default)]
        hand: Option<Vec<LandmarkPoint>>,
    },

    /// The client lost camera access or could not load its models.
    CameraError { message: String },
}

fn to_points(points: Option<Vec<LandmarkPoint>>) -> Option<Vec<Point3>> {
    points.map(|points| points.into_iter().map(Point3::from).collect())
}

/// Builds the core frame type from the landmark lists of a `Frame` message.
pub fn frame_observation(
    face: Option<Vec<LandmarkPoint>>,
    hand: Option<Vec<LandmarkPoint>>,
) -> FrameObservation {
    FrameObservation {
        face: to_points(face),
        hand: to_points(hand),
    }
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The current detection and reminder state. Sent on connect and on every change.
    MonitorStatus {
        detected: bool,
        face_present: bool,
        last_detected_at: Option<DateTime<Utc>>,
        hydration_reminder: bool,
        break_reminder: bool,
        camera_error: Option<String>,
    },

    /// Reports a problem with a client message. The connection stays open.
    Error { message: String },
}

impl From<MonitorSnapshot> for ServerMessage {
    fn from(snapshot: MonitorSnapshot) -> Self {
        ServerMessage::MonitorStatus {
            detected: snapshot.detected,
            face_present: snapshot.face_present,
            last_detected_at: snapshot.last_detected_at,
            hydration_reminder: snapshot.hydration_reminder,
            break_reminder: snapshot.break_reminder,
            camera_error: snapshot.camera_error,
        }
    }
}
