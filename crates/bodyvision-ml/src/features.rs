//! Feature extraction for pose classification.
//!
//! Layout (56 values, fixed order, matches the training exports):
//! - 0..52: 13 key landmarks × (x, y, z, visibility), zero-filled if absent
//! - 52: shoulder width (normalized euclidean, 11 ↔ 12)
//! - 53: wrist distance (15 ↔ 16)
//! - 54: left elbow minus left shoulder y (13 - 11)
//! - 55: right elbow minus right shoulder y (14 - 12)

use bodyvision_core::{Landmark, LandmarkPoint};

pub const KEY_LANDMARKS: [Landmark; 13] = [
    Landmark::Nose,
    Landmark::LeftShoulder,
    Landmark::RightShoulder,
    Landmark::LeftElbow,
    Landmark::RightElbow,
    Landmark::LeftWrist,
    Landmark::RightWrist,
    Landmark::LeftHip,
    Landmark::RightHip,
    Landmark::LeftKnee,
    Landmark::RightKnee,
    Landmark::LeftAnkle,
    Landmark::RightAnkle,
];

pub const VALUES_PER_LANDMARK: usize = 4;

pub const FEATURE_DIM: usize = KEY_LANDMARKS.len() * VALUES_PER_LANDMARK + 4;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector([f64; FEATURE_DIM]);

impl FeatureVector {
    pub fn from_landmarks(landmarks: &[LandmarkPoint]) -> Self {
        let mut values = [0.0; FEATURE_DIM];
        let get = |lm: Landmark| lm.in_frame(landmarks);

        for (slot, lm) in KEY_LANDMARKS.iter().enumerate() {
            if let Some(p) = get(*lm) {
                let base = slot * VALUES_PER_LANDMARK;
                values[base..base + VALUES_PER_LANDMARK]
                    .copy_from_slice(&[p.x, p.y, p.z, p.visibility()]);
            }
        }

        let tail = KEY_LANDMARKS.len() * VALUES_PER_LANDMARK;
        values[tail] = planar_distance(get(Landmark::LeftShoulder), get(Landmark::RightShoulder));
        values[tail + 1] = planar_distance(get(Landmark::LeftWrist), get(Landmark::RightWrist));
        values[tail + 2] = vertical_offset(get(Landmark::LeftShoulder), get(Landmark::LeftElbow));
        values[tail + 3] = vertical_offset(get(Landmark::RightShoulder), get(Landmark::RightElbow));

        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        FEATURE_DIM
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

fn planar_distance(a: Option<&LandmarkPoint>, b: Option<&LandmarkPoint>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt(),
        _ => 0.0,
    }
}

/// `to.y - from.y`, or 0 when either point is missing
fn vertical_offset(from: Option<&LandmarkPoint>, to: Option<&LandmarkPoint>) -> f64 {
    match (from, to) {
        (Some(from), Some(to)) => to.y - from.y,
        _ => 0.0,
    }
}
