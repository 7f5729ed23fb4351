//! crates/study_buddy_core/src/landmarks.rs
//!
//! Geometry over normalized face/hand landmarks. Decides, for one frame,
//! whether a hand is close enough to the mouth to count as drinking.

/// Face landmark indices of the upper and lower inner lip.
const MOUTH_UPPER: usize = 13;
const MOUTH_LOWER: usize = 14;

/// Hand landmark indices checked against the mouth: wrist, index base,
/// index tip, middle tip.
const HAND_POINTS: [usize; 4] = [0, 5, 8, 12];

/// Default hand-to-mouth distance, in normalized landmark units.
pub const DEFAULT_NEAR_MOUTH_THRESHOLD: f32 = 0.45;

/// A normalized landmark coordinate. `z` is relative depth.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn midpoint(&self, other: &Point3) -> Point3 {
        Point3 {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
            z: (self.z + other.z) / 2.0,
        }
    }

    pub fn distance(&self, other: &Point3) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// Landmarks observed in one video frame. Only the first detected face and
/// the first detected hand are used.
#[derive(Debug, Clone, Default)]
pub struct FrameObservation {
    pub face: Option<Vec<Point3>>,
    pub hand: Option<Vec<Point3>>,
}

impl FrameObservation {
    pub fn face_detected(&self) -> bool {
        self.face.as_ref().is_some_and(|points| !points.is_empty())
    }

    pub fn hand_detected(&self) -> bool {
        self.hand.as_ref().is_some_and(|points| !points.is_empty())
    }
}

/// Midpoint of the two inner-lip landmarks, if both exist.
pub fn mouth_center(face: &[Point3]) -> Option<Point3> {
    let upper = face.get(MOUTH_UPPER)?;
    let lower = face.get(MOUTH_LOWER)?;
    Some(upper.midpoint(lower))
}

/// Per-frame drinking signal: true if any tracked hand point lies strictly
/// within `threshold` of the mouth center.
pub fn is_drinking(frame: &FrameObservation, threshold: f32) -> bool {
    let (Some(face), Some(hand)) = (frame.face.as_deref(), frame.hand.as_deref()) else {
        return false;
    };
    let Some(mouth) = mouth_center(face) else {
        return false;
    };

    HAND_POINTS
        .iter()
        .filter_map(|&idx| hand.get(idx))
        .any(|point| point.distance(&mouth) < threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_with_mouth_at(p: Point3) -> Vec<Point3> {
        let mut face = vec![Point3::new(0.0, 0.0, 0.0); 20];
        face[MOUTH_UPPER] = Point3::new(p.x, p.y - 0.01, p.z);
        face[MOUTH_LOWER] = Point3::new(p.x, p.y + 0.01, p.z);
        face
    }

    fn hand_at(p: Point3) -> Vec<Point3> {
        vec![p; 21]
    }

    #[test]
    fn hand_near_mouth_is_drinking() {
        let frame = FrameObservation {
            face: Some(face_with_mouth_at(Point3::new(0.5, 0.5, 0.0))),
            hand: Some(hand_at(Point3::new(0.6, 0.6, 0.0))),
        };
        assert!(is_drinking(&frame, DEFAULT_NEAR_MOUTH_THRESHOLD));
    }

    #[test]
    fn hand_far_from_mouth_is_not_drinking() {
        let frame = FrameObservation {
            face: Some(face_with_mouth_at(Point3::new(0.1, 0.1, 0.0))),
            hand: Some(hand_at(Point3::new(0.9, 0.9, 0.0))),
        };
        assert!(!is_drinking(&frame, DEFAULT_NEAR_MOUTH_THRESHOLD));
    }

    #[test]
    fn depth_counts_toward_distance() {
        let frame = FrameObservation {
            face: Some(face_with_mouth_at(Point3::new(0.5, 0.5, 0.0))),
            hand: Some(hand_at(Point3::new(0.5, 0.5, 0.5))),
        };
        assert!(!is_drinking(&frame, DEFAULT_NEAR_MOUTH_THRESHOLD));
    }

    #[test]
    fn a_single_tracked_point_is_enough() {
        let mut hand = hand_at(Point3::new(1.0, 1.0, 0.0));
        hand[8] = Point3::new(0.5, 0.52, 0.0);
        let frame = FrameObservation {
            face: Some(face_with_mouth_at(Point3::new(0.5, 0.5, 0.0))),
            hand: Some(hand),
        };
        assert!(is_drinking(&frame, DEFAULT_NEAR_MOUTH_THRESHOLD));
    }

    #[test]
    fn missing_face_or_hand_is_never_drinking() {
        let face = face_with_mouth_at(Point3::new(0.5, 0.5, 0.0));
        let hand = hand_at(Point3::new(0.5, 0.5, 0.0));

        let no_hand = FrameObservation { face: Some(face), hand: None };
        let no_face = FrameObservation { face: None, hand: Some(hand) };

        assert!(!is_drinking(&no_hand, DEFAULT_NEAR_MOUTH_THRESHOLD));
        assert!(!is_drinking(&no_face, DEFAULT_NEAR_MOUTH_THRESHOLD));
    }

    #[test]
    fn truncated_face_mesh_has_no_mouth() {
        let frame = FrameObservation {
            face: Some(vec![Point3::new(0.5, 0.5, 0.0); 5]),
            hand: Some(hand_at(Point3::new(0.5, 0.5, 0.0))),
        };
        assert!(!is_drinking(&frame, DEFAULT_NEAR_MOUTH_THRESHOLD));
    }
}
