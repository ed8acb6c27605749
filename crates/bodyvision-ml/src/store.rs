//! Classifier model store.
//!
//! Models are read once from a directory:
//! `pose_classifier_general.json` plus optional
//! `pose_classifier_<pose_mode>.json` per pose. A pose-specific model is
//! preferred over the general one.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bodyvision_core::{LandmarkPoint, PoseMode};
use tracing::{debug, info, warn};

use crate::classifier::{ClassifierVerdict, LinearModel, PoseClassifier};
use crate::features::FeatureVector;

pub const GENERAL_MODEL_ID: &str = "general";

const MODEL_PREFIX: &str = "pose_classifier_";
const MODEL_EXTENSION: &str = "json";

/// Loaded classifiers, shared read-only across evaluations
#[derive(Clone, Default)]
pub struct ModelStore {
    general: Option<Arc<dyn PoseClassifier>>,
    per_pose: HashMap<PoseMode, Arc<dyn PoseClassifier>>,
}

impl ModelStore {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every model found in `dir`
    ///
    /// Never fails: a missing directory yields an empty store, and a
    /// model file that cannot be read is skipped with a warning.
    pub fn load<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        let mut store = Self::empty();

        if !dir.is_dir() {
            warn!("Model directory {} not found, using rules only", dir.display());
            return store;
        }

        let general = dir.join(format!("{}{}.{}", MODEL_PREFIX, GENERAL_MODEL_ID, MODEL_EXTENSION));
        if general.exists() {
            match LinearModel::load(&general) {
                Ok(model) => store.general = Some(Arc::new(model)),
                Err(e) => warn!("Skipping general model: {}", e),
            }
        }

        for mode in PoseMode::ALL {
            let path = dir.join(format!("{}{}.{}", MODEL_PREFIX, mode.as_str(), MODEL_EXTENSION));
            if !path.exists() {
                continue;
            }
            match LinearModel::load(&path) {
                Ok(model) => {
                    store.per_pose.insert(mode, Arc::new(model));
                }
                Err(e) => warn!("Skipping {} model: {}", mode, e),
            }
        }

        info!(
            "Loaded {} classifier model(s) from {}",
            store.len(),
            dir.display()
        );
        store
    }

    pub fn with_general(mut self, classifier: Arc<dyn PoseClassifier>) -> Self {
        self.general = Some(classifier);
        self
    }

    pub fn with_pose_model(mut self, mode: PoseMode, classifier: Arc<dyn PoseClassifier>) -> Self {
        self.per_pose.insert(mode, classifier);
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.len() > 0
    }

    pub fn len(&self) -> usize {
        self.per_pose.len() + usize::from(self.general.is_some())
    }

    pub fn is_empty(&self) -> bool {
        !self.is_loaded()
    }

    /// Pose-specific model first, then the general one
    fn select(&self, mode: PoseMode) -> Option<(&dyn PoseClassifier, &'static str)> {
        if let Some(model) = self.per_pose.get(&mode) {
            return Some((model.as_ref(), mode.as_str()));
        }
        self.general
            .as_deref()
            .map(|model| (model, GENERAL_MODEL_ID))
    }

    /// Classify one frame; `None` means "no opinion"
    pub fn evaluate(&self, landmarks: &[LandmarkPoint], mode: PoseMode) -> Option<ClassifierVerdict> {
        if landmarks.is_empty() {
            return None;
        }
        let (classifier, model_id) = self.select(mode)?;
        let features = FeatureVector::from_landmarks(landmarks);

        match ClassifierVerdict::from_classifier(classifier, &features, model_id) {
            Ok(verdict) => {
                debug!(
                    "Classifier {} -> prediction={} confidence={:.2}",
                    model_id, verdict.prediction, verdict.confidence
                );
                Some(verdict)
            }
            Err(e) => {
                warn!("Classifier {} failed: {}", model_id, e);
                None
            }
        }
    }
}

impl std::fmt::Debug for ModelStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut poses: Vec<_> = self.per_pose.keys().map(|m| m.as_str()).collect();
        poses.sort_unstable();
        f.debug_struct("ModelStore")
            .field("general", &self.general.is_some())
            .field("per_pose", &poses)
            .finish()
    }
}
