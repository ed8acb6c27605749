//! Per-frame pose evaluation service.

use std::path::Path;
use std::sync::Arc;

use bodyvision_core::{
    AngleSet, Error, KeypointExtractor, LandmarkPoint, PoseMode, Result, Status,
};
use bodyvision_ml::{FusedFeedback, FusionEngine, ModelStore};
use bodyvision_rules::{
    EvaluationResult, PoseRuleEvaluator, PoseThresholds, StatusClassifier, ThresholdProvider,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::metrics::PoseMetricsCatalog;

/// Reported when a body is present but the evaluation joints are not
pub const MSG_DETECTION_FAILED: &str = "Não foi possível detectar os pontos necessários";

/// Outcome of evaluating one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseAssessment {
    /// Rule feedback; `None` when no body was detected
    pub message: Option<String>,
    pub status: Status,

    /// Rules fused with the classifier, when classification is active
    pub fused: Option<FusedFeedback>,

    /// Status recovered from the fused message
    pub fused_status: Option<Status>,
}

impl PoseAssessment {
    pub fn no_body() -> Self {
        Self {
            message: None,
            status: Status::NoDetection,
            fused: None,
            fused_status: None,
        }
    }

    fn from_rules(result: EvaluationResult) -> Self {
        Self {
            message: Some(result.message),
            status: result.status,
            fused: None,
            fused_status: None,
        }
    }

    /// The message to show: fused when available, otherwise the rules'
    pub fn display_message(&self) -> Option<&str> {
        self.fused
            .as_ref()
            .map(|f| f.message.as_str())
            .or(self.message.as_deref())
    }

    /// JSON payload handed to the transport layer
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Result of selecting a pose mode by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoseSelection {
    pub mode: PoseMode,
    pub name: &'static str,
}

/// Pose evaluation service
///
/// Holds the read-only evaluation components plus the current metrics
/// catalogue, which can be swapped at runtime.
pub struct PoseService {
    config: EngineConfig,
    extractor: KeypointExtractor,
    evaluator: PoseRuleEvaluator,
    status: StatusClassifier,
    fusion: FusionEngine,
    models: ModelStore,
    metrics: RwLock<Arc<PoseMetricsCatalog>>,
}

impl PoseService {
    /// Build a service, loading models and metrics named in the config
    pub fn new(config: EngineConfig) -> Self {
        let models = if config.ml.enabled {
            ModelStore::load(&config.ml.models_dir)
        } else {
            ModelStore::empty()
        };
        let metrics = if config.metrics.enabled {
            PoseMetricsCatalog::load(&config.metrics.path)
        } else {
            PoseMetricsCatalog::empty()
        };
        Self::with_components(config, models, metrics)
    }

    /// Build from a configuration file (plus `BODYVISION_*` environment)
    pub fn from_config_file(path: &str) -> Result<Self> {
        let config = EngineConfig::from_file(path).map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self::new(config))
    }

    pub fn with_components(
        config: EngineConfig,
        models: ModelStore,
        metrics: PoseMetricsCatalog,
    ) -> Self {
        let evaluator =
            PoseRuleEvaluator::new(PoseThresholds::default(), config.rules.visibility_threshold);
        let fusion = FusionEngine::new(config.ml.confidence_threshold);

        tracing::info!(
            "Pose service ready (classifier models: {}, metrics poses: {})",
            models.len(),
            metrics.len()
        );

        Self {
            config,
            extractor: KeypointExtractor::new(),
            evaluator,
            status: StatusClassifier::new(),
            fusion,
            models,
            metrics: RwLock::new(Arc::new(metrics)),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn models(&self) -> &ModelStore {
        &self.models
    }

    /// Snapshot of the current metrics catalogue
    pub fn metrics(&self) -> Arc<PoseMetricsCatalog> {
        Arc::clone(&self.metrics.read())
    }

    /// Validate a pose-mode name and return its display name
    pub fn select_pose(&self, name: &str) -> Result<PoseSelection> {
        let mode: PoseMode = name.parse()?;
        tracing::info!("Pose selected: {}", mode.display_name());
        Ok(PoseSelection {
            mode,
            name: mode.display_name(),
        })
    }

    /// Re-read the metrics file and swap in the new catalogue
    pub fn reload_metrics(&self) -> Arc<PoseMetricsCatalog> {
        let current = self.metrics();
        let fresh = if self.config.metrics.enabled {
            Arc::new(match current.source() {
                Some(_) => current.reload(),
                None => PoseMetricsCatalog::load(&self.config.metrics.path),
            })
        } else {
            current
        };
        *self.metrics.write() = Arc::clone(&fresh);
        fresh
    }

    /// Replace the metrics catalogue with one loaded from `path`
    pub fn load_metrics_from<P: AsRef<Path>>(&self, path: P) -> Arc<PoseMetricsCatalog> {
        let fresh = Arc::new(PoseMetricsCatalog::load(path));
        *self.metrics.write() = Arc::clone(&fresh);
        fresh
    }

    /// Evaluate one detector frame
    ///
    /// `landmarks` is `None` when the detector found no body.
    /// `camera_width` falls back to the configured default.
    pub fn evaluate(
        &self,
        landmarks: Option<&[LandmarkPoint]>,
        mode: PoseMode,
        camera_width: Option<u32>,
        frame_height: u32,
    ) -> PoseAssessment {
        let Some(landmarks) = landmarks else {
            return PoseAssessment::no_body();
        };
        let width = camera_width.unwrap_or(self.config.camera.default_width);

        let keypoints = match self.extractor.try_extract(landmarks, width, frame_height) {
            Ok(keypoints) => keypoints,
            Err(e) => {
                tracing::debug!("Cannot evaluate {}: {}", mode, e);
                return PoseAssessment::from_rules(EvaluationResult::no_detection(
                    MSG_DETECTION_FAILED,
                ));
            }
        };

        let angles = AngleSet::from_keypoints(&keypoints, self.evaluator.visibility_threshold());
        let catalog = self.metrics();
        let provider = self
            .config
            .metrics
            .enabled
            .then_some(&*catalog as &dyn ThresholdProvider);

        let result = self
            .evaluator
            .evaluate_with(mode, &keypoints, &angles, width, provider);
        let mut assessment = PoseAssessment::from_rules(result);

        if self.config.ml.enabled && self.models.is_loaded() {
            let verdict = self.models.evaluate(landmarks, mode);
            let rule_message = assessment.message.as_deref().unwrap_or_default();
            let fused = self.fusion.fuse(rule_message, verdict.as_ref());
            assessment.fused_status = Some(self.status.classify(Some(&fused.message)));
            assessment.fused = Some(fused);
        }

        assessment
    }

    /// Evaluate with the pose mode given by name
    pub fn evaluate_named(
        &self,
        landmarks: Option<&[LandmarkPoint]>,
        mode: &str,
        camera_width: Option<u32>,
        frame_height: u32,
    ) -> Result<PoseAssessment> {
        let mode: PoseMode = mode.parse()?;
        Ok(self.evaluate(landmarks, mode, camera_width, frame_height))
    }
}

impl Default for PoseService {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodyvision_core::Landmark;
    use bodyvision_ml::{LinearModel, Provenance, FEATURE_DIM};

    const WIDTH: u32 = 640;
    const HEIGHT: u32 = 480;

    fn offline_config() -> EngineConfig {
        let mut config = EngineConfig::default();
        config.ml.models_dir = "/nonexistent/models".into();
        config.metrics.path = "/nonexistent/metrics.json".into();
        config.camera.default_width = WIDTH;
        config
    }

    fn service() -> PoseService {
        PoseService::with_components(
            offline_config(),
            ModelStore::empty(),
            PoseMetricsCatalog::empty(),
        )
    }

    fn set(frame: &mut [LandmarkPoint], lm: Landmark, px: f64, py: f64) {
        frame[lm.index()] = LandmarkPoint::new(px / WIDTH as f64, py / HEIGHT as f64, 0.0, 0.95);
    }

    /// Frontal double-biceps frame: both elbows at ~90°, centered
    fn double_biceps_frame() -> Vec<LandmarkPoint> {
        let mut frame = vec![LandmarkPoint::new(0.5, 0.5, 0.0, 0.95); Landmark::COUNT];
        set(&mut frame, Landmark::LeftShoulder, 280.0, 150.0);
        set(&mut frame, Landmark::RightShoulder, 360.0, 150.0);
        set(&mut frame, Landmark::LeftElbow, 200.0, 150.0);
        set(&mut frame, Landmark::RightElbow, 440.0, 150.0);
        set(&mut frame, Landmark::LeftWrist, 200.0, 70.0);
        set(&mut frame, Landmark::RightWrist, 440.0, 70.0);
        set(&mut frame, Landmark::LeftHip, 290.0, 300.0);
        set(&mut frame, Landmark::RightHip, 350.0, 300.0);
        set(&mut frame, Landmark::LeftKnee, 290.0, 390.0);
        set(&mut frame, Landmark::RightKnee, 350.0, 390.0);
        set(&mut frame, Landmark::LeftAnkle, 290.0, 470.0);
        set(&mut frame, Landmark::RightAnkle, 350.0, 470.0);
        frame
    }

    fn model_store(bias: f64) -> ModelStore {
        let model = LinearModel::new(vec![0.0; FEATURE_DIM], bias).unwrap();
        ModelStore::empty().with_general(Arc::new(model))
    }

    #[test]
    fn test_no_body() {
        let assessment = service().evaluate(None, PoseMode::DoubleBiceps, Some(WIDTH), HEIGHT);
        assert_eq!(assessment, PoseAssessment::no_body());
        assert!(assessment.display_message().is_none());
    }

    #[test]
    fn test_assessment_json_payload() {
        let frame = double_biceps_frame();
        let assessment =
            service().evaluate(Some(&frame), PoseMode::DoubleBiceps, Some(WIDTH), HEIGHT);
        let json = assessment.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "incorrect");
        assert!(value["fused"].is_null());

        let back: PoseAssessment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, assessment);
    }

    #[test]
    fn test_truncated_frame_is_detection_failure() {
        let frame: Vec<_> = double_biceps_frame().into_iter().take(20).collect();
        let assessment =
            service().evaluate(Some(&frame), PoseMode::DoubleBiceps, Some(WIDTH), HEIGHT);
        assert_eq!(assessment.message.as_deref(), Some(MSG_DETECTION_FAILED));
        assert_eq!(assessment.status, Status::NoDetection);
    }

    #[test]
    fn test_rules_only_evaluation() {
        let frame = double_biceps_frame();
        let assessment =
            service().evaluate(Some(&frame), PoseMode::DoubleBiceps, Some(WIDTH), HEIGHT);
        // 90° elbows are outside the 30-80° band
        assert_eq!(assessment.status, Status::Incorrect);
        assert!(assessment.fused.is_none());
        assert!(assessment.fused_status.is_none());
    }

    #[test]
    fn test_metrics_override_primary_band() {
        let catalog = PoseMetricsCatalog::from_json(
            r#"[{"pose_mode": "double_biceps",
                 "extracted_metrics": {"angles": {"arm": {"min": 80, "max": 100}}}}]"#,
        )
        .unwrap();
        let service = PoseService::with_components(offline_config(), ModelStore::empty(), catalog);

        let frame = double_biceps_frame();
        let assessment =
            service.evaluate(Some(&frame), PoseMode::DoubleBiceps, Some(WIDTH), HEIGHT);
        assert_eq!(assessment.status, Status::Correct);
    }

    #[test]
    fn test_metrics_ignored_when_disabled() {
        let catalog = PoseMetricsCatalog::from_json(
            r#"[{"pose_mode": "double_biceps",
                 "extracted_metrics": {"angles": {"arm": {"min": 80, "max": 100}}}}]"#,
        )
        .unwrap();
        let mut config = offline_config();
        config.metrics.enabled = false;
        let service = PoseService::with_components(config, ModelStore::empty(), catalog);

        let frame = double_biceps_frame();
        let assessment =
            service.evaluate(Some(&frame), PoseMode::DoubleBiceps, Some(WIDTH), HEIGHT);
        assert_eq!(assessment.status, Status::Incorrect);
    }

    #[test]
    fn test_confident_classifier_overrides_rules() {
        let service = PoseService::with_components(
            offline_config(),
            model_store(4.0),
            PoseMetricsCatalog::empty(),
        );
        let frame = double_biceps_frame();
        let assessment =
            service.evaluate(Some(&frame), PoseMode::DoubleBiceps, Some(WIDTH), HEIGHT);

        assert_eq!(assessment.status, Status::Incorrect);
        let rule_message = assessment.message.clone().unwrap();
        let fused = assessment.fused.as_ref().unwrap();
        assert_eq!(fused.provenance, Provenance::MlHighConfidence);
        assert!(fused.is_correct);
        // "incorreta" matches "correta", so the sources count as agreeing
        assert_eq!(fused.message, format!("✅ [ML] {}", rule_message));
        // the fused text still carries the error keywords
        assert_eq!(assessment.fused_status, Some(Status::Incorrect));
        assert_eq!(assessment.display_message(), Some(fused.message.as_str()));
    }

    #[test]
    fn test_classifier_disabled_in_config() {
        let mut config = offline_config();
        config.ml.enabled = false;
        let service =
            PoseService::with_components(config, model_store(4.0), PoseMetricsCatalog::empty());
        let frame = double_biceps_frame();
        let assessment =
            service.evaluate(Some(&frame), PoseMode::DoubleBiceps, Some(WIDTH), HEIGHT);
        assert!(assessment.fused.is_none());
    }

    #[test]
    fn test_default_camera_width() {
        let frame = double_biceps_frame();
        let service = service();
        let explicit = service.evaluate(Some(&frame), PoseMode::Enquadramento, Some(WIDTH), HEIGHT);
        let fallback = service.evaluate(Some(&frame), PoseMode::Enquadramento, None, HEIGHT);
        assert_eq!(explicit, fallback);
    }

    #[test]
    fn test_select_pose() {
        let service = service();
        let selection = service.select_pose("double_biceps").unwrap();
        assert_eq!(selection.mode, PoseMode::DoubleBiceps);
        assert_eq!(selection.name, "Duplo Biceps (Frente)");

        assert!(matches!(
            service.select_pose("front_lat_spread"),
            Err(Error::UnknownPoseMode(_))
        ));
    }

    #[test]
    fn test_evaluate_named_rejects_unknown_mode() {
        let frame = double_biceps_frame();
        let result = service().evaluate_named(Some(&frame), "vacuum", Some(WIDTH), HEIGHT);
        assert!(matches!(result, Err(Error::UnknownPoseMode(_))));

        let result = service().evaluate_named(Some(&frame), "side_chest", Some(WIDTH), HEIGHT);
        assert!(result.is_ok());
    }

    #[test]
    fn test_reload_metrics_swaps_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pose_info_training_data.json");
        std::fs::write(&path, "[]").unwrap();

        let mut config = offline_config();
        config.metrics.path = path.clone();
        let service = PoseService::new(config);
        let before = service.metrics();
        assert!(before.is_empty());

        std::fs::write(
            &path,
            r#"[{"pose_mode": "side_chest",
                 "extracted_metrics": {"angles": {"arm": {"value": 100}}}}]"#,
        )
        .unwrap();
        let after = service.reload_metrics();

        assert!(after.has_metrics(PoseMode::SideChest));
        assert!(service.metrics().has_metrics(PoseMode::SideChest));
        // snapshots taken before the swap stay valid
        assert!(before.is_empty());
    }

    #[test]
    fn test_load_metrics_from_swaps_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("side_chest_metrics.json");
        std::fs::write(
            &path,
            r#"[{"pose_mode": "side_chest",
                 "extracted_metrics": {"angles": {"arm": {"value": 100}}}}]"#,
        )
        .unwrap();

        let service = PoseService::new(offline_config());
        let before = service.metrics();
        assert!(before.is_empty());

        let after = service.load_metrics_from(&path);

        assert!(after.has_metrics(PoseMode::SideChest));
        assert!(service.metrics().has_metrics(PoseMode::SideChest));
        assert!(before.is_empty());
        assert!(!before.has_metrics(PoseMode::SideChest));
    }

    #[test]
    fn test_missing_resources_fall_back_to_rules() {
        let service = PoseService::new(offline_config());
        assert!(!service.models().is_loaded());
        assert!(service.metrics().is_empty());

        let frame = double_biceps_frame();
        let assessment =
            service.evaluate(Some(&frame), PoseMode::DoubleBiceps, Some(WIDTH), HEIGHT);
        assert!(assessment.fused.is_none());
        assert_eq!(assessment.status, Status::Incorrect);
    }
}
