//! # BodyVision-Core
//!
//! Core types and geometry for the BodyVision bodybuilding pose
//! evaluation engine: camera landmarks, pixel-scaled keypoints,
//! joint angles and the pose-mode / status vocabulary shared by the
//! rule evaluator and the classifier fusion.

pub mod error;
pub mod geometry;
pub mod keypoints;
pub mod types;

pub use error::{Error, Result};
pub use geometry::*;
pub use keypoints::*;
pub use types::*;
