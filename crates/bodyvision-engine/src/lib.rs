//! # BodyVision-Engine
//!
//! The configured evaluation service tying the pipeline together:
//! landmarks → keypoints → angles → rules → (classifier fusion) → status.
//!
//! - **config** - engine configuration (file + `BODYVISION_*` environment)
//! - **metrics** - pose-metrics catalogue supplying dynamic angle bands
//! - **service** - `PoseService`, the per-frame entry point

pub mod config;
pub mod metrics;
pub mod service;

pub use config::*;
pub use metrics::*;
pub use service::*;
