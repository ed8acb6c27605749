//! Bilateral side selection for profile poses.
//!
//! In side chest and side triceps only one arm is judged, and the
//! detector does not say which one faces the camera. Each visible arm
//! gets an additive score from its elbow angle and its shoulder's
//! horizontal distance to the image center; the higher score wins and
//! ties go to the right arm.

use bodyvision_core::{AngleName, Joint};
use serde::{Deserialize, Serialize};

/// Weight applied to the distance term of both scores
pub const DISTANCE_WEIGHT: f64 = 0.1;

/// Angle below which a side-chest arm starts scoring as flexed
pub const SIDE_CHEST_ANGLE_PIVOT: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn arm_angle(self) -> AngleName {
        match self {
            Side::Left => AngleName::LeftArm,
            Side::Right => AngleName::RightArm,
        }
    }

    pub fn knee_angle(self) -> AngleName {
        match self {
            Side::Left => AngleName::LeftKnee,
            Side::Right => AngleName::RightKnee,
        }
    }

    pub fn shoulder(self) -> Joint {
        match self {
            Side::Left => Joint::LeftShoulder,
            Side::Right => Joint::RightShoulder,
        }
    }

    pub fn elbow(self) -> Joint {
        match self {
            Side::Left => Joint::LeftElbow,
            Side::Right => Joint::RightElbow,
        }
    }

    pub fn wrist(self) -> Joint {
        match self {
            Side::Left => Joint::LeftWrist,
            Side::Right => Joint::RightWrist,
        }
    }
}

/// Frontal-arm score for side chest: favors a flexed arm near the center
pub fn side_chest_score(angle: f64, shoulder_x: f64, camera_width: f64) -> f64 {
    let center = camera_width / 2.0;
    let angle_score = (SIDE_CHEST_ANGLE_PIVOT - angle).max(0.0);
    let distance_score = (camera_width - (shoulder_x - center).abs()).max(0.0);
    angle_score + distance_score * DISTANCE_WEIGHT
}

/// Posterior-arm score for side triceps: favors an extended arm far from the center
pub fn side_triceps_score(angle: f64, shoulder_x: f64, camera_width: f64) -> f64 {
    let center = camera_width / 2.0;
    angle + (shoulder_x - center).abs() * DISTANCE_WEIGHT
}

/// Pick the winning side from per-arm scores (`None` = arm not visible)
///
/// Left wins only with a strictly greater score; otherwise the right arm
/// is chosen when visible.
pub fn select_side(left: Option<f64>, right: Option<f64>) -> Option<Side> {
    let left_score = left.unwrap_or(0.0);
    let right_score = right.unwrap_or(0.0);

    if left.is_some() && left_score > right_score {
        Some(Side::Left)
    } else if right.is_some() {
        Some(Side::Right)
    } else {
        None
    }
}
