//! Error types for the BodyVision engine.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing landmarks: need {required}, have {available}")]
    MissingLandmarks { required: usize, available: usize },

    #[error("Unknown pose mode: {0}")]
    UnknownPoseMode(String),

    #[error("Model loading error: {0}")]
    ModelLoad(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[error("Pose metrics error: {0}")]
    Metrics(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
