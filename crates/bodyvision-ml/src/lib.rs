//! # BodyVision-ML
//!
//! Optional machine-learning augmentation of the pose rules.
//!
//! - **features** - the fixed 56-value feature vector a classifier sees
//! - **classifier** - classifier trait, verdicts and the JSON linear model
//! - **store** - per-pose and general models loaded once at startup
//! - **fusion** - blends the rule message with a classifier verdict
//!
//! Classifier faults never propagate: the store logs them and reports
//! no verdict, which fuses as rules only.

pub mod classifier;
pub mod features;
pub mod fusion;
pub mod store;

pub use classifier::*;
pub use features::*;
pub use fusion::*;
pub use store::*;
