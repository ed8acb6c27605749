//! Fundamental types for the BodyVision engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Minimum detector visibility for a joint to take part in geometry
pub const VISIBILITY_THRESHOLD: f64 = 0.5;

/// A single detected body point, normalized to the frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    /// Horizontal position in [0, 1]
    pub x: f64,
    /// Vertical position in [0, 1], growing downward
    pub y: f64,
    /// Unscaled depth relative to the hips
    pub z: f64,
    /// Detector confidence that the point is observed
    #[serde(default)]
    pub visibility: Option<f64>,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64, z: f64, visibility: f64) -> Self {
        Self {
            x,
            y,
            z,
            visibility: Some(visibility),
        }
    }

    /// Visibility, reading an absent value as fully visible
    pub fn visibility(&self) -> f64 {
        self.visibility.unwrap_or(1.0)
    }
}

/// 33-point body landmark convention of the upstream detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Landmark {
    Nose = 0,
    LeftEyeInner = 1,
    LeftEye = 2,
    LeftEyeOuter = 3,
    RightEyeInner = 4,
    RightEye = 5,
    RightEyeOuter = 6,
    LeftEar = 7,
    RightEar = 8,
    MouthLeft = 9,
    MouthRight = 10,
    LeftShoulder = 11,
    RightShoulder = 12,
    LeftElbow = 13,
    RightElbow = 14,
    LeftWrist = 15,
    RightWrist = 16,
    LeftPinky = 17,
    RightPinky = 18,
    LeftIndex = 19,
    RightIndex = 20,
    LeftThumb = 21,
    RightThumb = 22,
    LeftHip = 23,
    RightHip = 24,
    LeftKnee = 25,
    RightKnee = 26,
    LeftAnkle = 27,
    RightAnkle = 28,
    LeftHeel = 29,
    RightHeel = 30,
    LeftFootIndex = 31,
    RightFootIndex = 32,
}

impl Landmark {
    pub const COUNT: usize = 33;

    pub const ALL: [Landmark; Landmark::COUNT] = [
        Self::Nose,
        Self::LeftEyeInner,
        Self::LeftEye,
        Self::LeftEyeOuter,
        Self::RightEyeInner,
        Self::RightEye,
        Self::RightEyeOuter,
        Self::LeftEar,
        Self::RightEar,
        Self::MouthLeft,
        Self::MouthRight,
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftPinky,
        Self::RightPinky,
        Self::LeftIndex,
        Self::RightIndex,
        Self::LeftThumb,
        Self::RightThumb,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
        Self::LeftHeel,
        Self::RightHeel,
        Self::LeftFootIndex,
        Self::RightFootIndex,
    ];

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up this landmark in a detector frame
    pub fn in_frame(self, landmarks: &[LandmarkPoint]) -> Option<&LandmarkPoint> {
        landmarks.get(self.index())
    }
}

/// The 12 joints used by pose evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Joint {
    LeftShoulder = 0,
    RightShoulder = 1,
    LeftElbow = 2,
    RightElbow = 3,
    LeftWrist = 4,
    RightWrist = 5,
    LeftHip = 6,
    RightHip = 7,
    LeftKnee = 8,
    RightKnee = 9,
    LeftAnkle = 10,
    RightAnkle = 11,
}

impl Joint {
    pub const COUNT: usize = 12;

    pub const ALL: [Joint; Joint::COUNT] = [
        Self::LeftShoulder,
        Self::RightShoulder,
        Self::LeftElbow,
        Self::RightElbow,
        Self::LeftWrist,
        Self::RightWrist,
        Self::LeftHip,
        Self::RightHip,
        Self::LeftKnee,
        Self::RightKnee,
        Self::LeftAnkle,
        Self::RightAnkle,
    ];

    /// Detector landmark this joint is read from
    pub fn landmark(self) -> Landmark {
        match self {
            Self::LeftShoulder => Landmark::LeftShoulder,
            Self::RightShoulder => Landmark::RightShoulder,
            Self::LeftElbow => Landmark::LeftElbow,
            Self::RightElbow => Landmark::RightElbow,
            Self::LeftWrist => Landmark::LeftWrist,
            Self::RightWrist => Landmark::RightWrist,
            Self::LeftHip => Landmark::LeftHip,
            Self::RightHip => Landmark::RightHip,
            Self::LeftKnee => Landmark::LeftKnee,
            Self::RightKnee => Landmark::RightKnee,
            Self::LeftAnkle => Landmark::LeftAnkle,
            Self::RightAnkle => Landmark::RightAnkle,
        }
    }

    /// Canonical upper-case joint name
    pub fn name(self) -> &'static str {
        match self {
            Self::LeftShoulder => "LEFT_SHOULDER",
            Self::RightShoulder => "RIGHT_SHOULDER",
            Self::LeftElbow => "LEFT_ELBOW",
            Self::RightElbow => "RIGHT_ELBOW",
            Self::LeftWrist => "LEFT_WRIST",
            Self::RightWrist => "RIGHT_WRIST",
            Self::LeftHip => "LEFT_HIP",
            Self::RightHip => "RIGHT_HIP",
            Self::LeftKnee => "LEFT_KNEE",
            Self::RightKnee => "RIGHT_KNEE",
            Self::LeftAnkle => "LEFT_ANKLE",
            Self::RightAnkle => "RIGHT_ANKLE",
        }
    }
}

/// Joint position in pixels with detector visibility
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
    pub visibility: f64,
}

impl PixelPoint {
    pub fn new(x: i32, y: i32, visibility: f64) -> Self {
        Self { x, y, visibility }
    }

    pub fn is_visible(&self, threshold: f64) -> bool {
        self.visibility >= threshold
    }
}

/// Pixel-scaled joints of a single frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeypointSet {
    points: [Option<PixelPoint>; Joint::COUNT],
}

impl KeypointSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builder used by extraction and fixtures; sets one joint
    pub fn with(mut self, joint: Joint, point: PixelPoint) -> Self {
        self.points[joint as usize] = Some(point);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.points.iter().all(Option::is_none)
    }

    pub fn len(&self) -> usize {
        self.points.iter().flatten().count()
    }

    pub fn get(&self, joint: Joint) -> Option<&PixelPoint> {
        self.points[joint as usize].as_ref()
    }

    /// The joint, only if it meets the visibility threshold
    pub fn visible(&self, joint: Joint, threshold: f64) -> Option<&PixelPoint> {
        self.get(joint).filter(|p| p.is_visible(threshold))
    }

    pub fn is_visible(&self, joint: Joint, threshold: f64) -> bool {
        self.visible(joint, threshold).is_some()
    }

    pub fn contains_all(&self, joints: &[Joint]) -> bool {
        joints.iter().all(|j| self.get(*j).is_some())
    }

    pub fn all_visible(&self, joints: &[Joint], threshold: f64) -> bool {
        joints.iter().all(|j| self.is_visible(*j, threshold))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Joint, &PixelPoint)> {
        Joint::ALL
            .iter()
            .zip(self.points.iter())
            .filter_map(|(j, p)| p.as_ref().map(|p| (*j, p)))
    }
}

/// The five evaluated competition poses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoseMode {
    DoubleBiceps,
    SideChest,
    SideTriceps,
    MostMuscular,
    /// Framing check: is the athlete centered in the camera
    Enquadramento,
}

impl PoseMode {
    pub const ALL: [PoseMode; 5] = [
        Self::DoubleBiceps,
        Self::SideChest,
        Self::SideTriceps,
        Self::MostMuscular,
        Self::Enquadramento,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DoubleBiceps => "double_biceps",
            Self::SideChest => "side_chest",
            Self::SideTriceps => "side_triceps",
            Self::MostMuscular => "most_muscular",
            Self::Enquadramento => "enquadramento",
        }
    }

    /// Name shown to the athlete when the pose is selected
    pub fn display_name(self) -> &'static str {
        match self {
            Self::DoubleBiceps => "Duplo Biceps (Frente)",
            Self::SideChest => "Side Chest",
            Self::SideTriceps => "Side Triceps",
            Self::MostMuscular => "Most Muscular",
            Self::Enquadramento => "Enquadramento",
        }
    }
}

impl fmt::Display for PoseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PoseMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| Error::UnknownPoseMode(s.to_string()))
    }
}

/// Coarse outcome of an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Correct,
    Incorrect,
    AdjustmentNeeded,
    NoDetection,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Correct => "correct",
            Self::Incorrect => "incorrect",
            Self::AdjustmentNeeded => "adjustment_needed",
            Self::NoDetection => "no_detection",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
