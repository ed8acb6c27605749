//! # BodyVision-Rules
//!
//! Rule-based judging of the five bodybuilding poses.
//!
//! ## Pipeline
//!
//! 1. **Thresholds** - hardcoded angle bands per pose, optionally
//!    overridden by a dynamic threshold provider
//! 2. **Side selection** - picks the frontal (side chest) or posterior
//!    (side triceps) arm of a profile pose by additive scoring
//! 3. **Evaluation** - one procedure per pose mode, producing a
//!    feedback message and a status
//! 4. **Status classification** - recovers a status from free text when
//!    the message is the only channel available
//!
//! Every procedure is a pure function of a single frame.

pub mod evaluator;
pub mod selection;
pub mod status;
pub mod thresholds;

pub use evaluator::*;
pub use selection::*;
pub use status::*;
pub use thresholds::*;
