//! Joint-angle computations.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::types::{Joint, KeypointSet, PixelPoint};

/// Calculate angle between two vectors in radians
///
/// Zero-length vectors yield 0. The cosine is clamped into [-1, 1]
/// so the result always lies in [0, π].
pub fn angle_between(v1: &Vector2<f64>, v2: &Vector2<f64>) -> f64 {
    let n1 = v1.norm();
    let n2 = v2.norm();
    if n1 == 0.0 || n2 == 0.0 {
        0.0
    } else {
        (v1.dot(v2) / (n1 * n2)).clamp(-1.0, 1.0).acos()
    }
}

/// Included angle at `b` formed by `a-b-c`, in degrees [0, 180]
pub fn joint_angle(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    angle_between(&(a - b), &(c - b)).to_degrees()
}

impl PixelPoint {
    pub fn to_point2(&self) -> Point2<f64> {
        Point2::new(self.x as f64, self.y as f64)
    }
}

/// Named joint angles used by the pose rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleName {
    LeftArm,
    RightArm,
    LeftKnee,
    RightKnee,
}

impl AngleName {
    pub const COUNT: usize = 4;

    pub const ALL: [AngleName; AngleName::COUNT] =
        [Self::LeftArm, Self::RightArm, Self::LeftKnee, Self::RightKnee];

    /// The three joints (outer, vertex, outer) defining this angle
    pub fn joints(self) -> [Joint; 3] {
        match self {
            Self::LeftArm => [Joint::LeftShoulder, Joint::LeftElbow, Joint::LeftWrist],
            Self::RightArm => [Joint::RightShoulder, Joint::RightElbow, Joint::RightWrist],
            Self::LeftKnee => [Joint::LeftHip, Joint::LeftKnee, Joint::LeftAnkle],
            Self::RightKnee => [Joint::RightHip, Joint::RightKnee, Joint::RightAnkle],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::LeftArm => "left_arm",
            Self::RightArm => "right_arm",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
        }
    }
}

/// Joint angles of a single frame, in degrees
///
/// An angle is present only when its three joints exist and each is
/// visible at the given threshold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AngleSet {
    angles: [Option<f64>; AngleName::COUNT],
}

impl AngleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_keypoints(keypoints: &KeypointSet, visibility_threshold: f64) -> Self {
        let mut set = Self::empty();
        for name in AngleName::ALL {
            let [a, b, c] = name.joints();
            if let (Some(a), Some(b), Some(c)) = (
                keypoints.visible(a, visibility_threshold),
                keypoints.visible(b, visibility_threshold),
                keypoints.visible(c, visibility_threshold),
            ) {
                set.angles[name as usize] =
                    Some(joint_angle(a.to_point2(), b.to_point2(), c.to_point2()));
            }
        }
        set
    }

    /// Builder for fixtures; sets one angle, clamped into [0, 180]
    pub fn with(mut self, name: AngleName, degrees: f64) -> Self {
        self.angles[name as usize] = Some(degrees.clamp(0.0, 180.0));
        self
    }

    pub fn get(&self, name: AngleName) -> Option<f64> {
        self.angles[name as usize]
    }

    /// The angle, or 0 when it could not be computed
    pub fn or_zero(&self, name: AngleName) -> f64 {
        self.get(name).unwrap_or(0.0)
    }
}
