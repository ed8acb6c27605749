//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Camera defaults
    pub camera: CameraConfig,

    /// Classifier augmentation
    pub ml: MlConfig,

    /// Pose-metrics catalogue
    pub metrics: MetricsConfig,

    /// Rule evaluation
    pub rules: RulesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Width used when the caller does not report one (pixels)
    pub default_width: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MlConfig {
    pub enabled: bool,

    /// Directory holding `pose_classifier_*.json`
    pub models_dir: PathBuf,

    /// Minimum classifier confidence to override the rules
    pub confidence_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,

    /// JSON export of annotated pose samples
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Minimum landmark visibility for a joint to count
    pub visibility_threshold: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { default_width: 1280 }
    }
}

impl Default for MlConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            models_dir: PathBuf::from("ml/models"),
            confidence_threshold: bodyvision_ml::DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: PathBuf::from("ml/data/processed/pose_info_training_data.json"),
        }
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            visibility_threshold: bodyvision_core::VISIBILITY_THRESHOLD,
        }
    }
}

impl EngineConfig {
    /// Load configuration from file
    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("BODYVISION").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::Environment::with_prefix("BODYVISION").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.camera.default_width, 1280);
        assert!(config.ml.enabled);
        assert!((config.ml.confidence_threshold - 0.7).abs() < 1e-12);
        assert_eq!(config.ml.models_dir, PathBuf::from("ml/models"));
        assert!((config.rules.visibility_threshold - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bodyvision.toml");
        std::fs::write(
            &path,
            "[ml]\nenabled = false\nconfidence_threshold = 0.9\n\n[camera]\ndefault_width = 640\n",
        )
        .unwrap();

        let config = EngineConfig::from_file(path.to_str().unwrap()).unwrap();
        assert!(!config.ml.enabled);
        assert!((config.ml.confidence_threshold - 0.9).abs() < 1e-12);
        assert_eq!(config.camera.default_width, 640);
        assert!(config.metrics.enabled);
        assert!((config.rules.visibility_threshold - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = EngineConfig::from_file("/nonexistent/bodyvision");
        assert!(result.is_err());
    }
}
