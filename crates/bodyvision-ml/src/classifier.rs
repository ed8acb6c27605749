//! Pose classifiers and their verdicts.

use std::path::Path;

use bodyvision_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::features::{FeatureVector, FEATURE_DIM};

/// Confidence reported when a classifier cannot give probabilities
pub const FALLBACK_CONFIDENCE_CORRECT: f64 = 0.8;
pub const FALLBACK_CONFIDENCE_INCORRECT: f64 = 0.2;

/// Binary pose classifier: `true` means the pose is correct
pub trait PoseClassifier: Send + Sync {
    fn predict(&self, features: &FeatureVector) -> Result<bool>;

    /// `[p_incorrect, p_correct]`, if the model exposes probabilities
    fn predict_proba(&self, _features: &FeatureVector) -> Result<Option<[f64; 2]>> {
        Ok(None)
    }
}

/// Output of one classifier run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierVerdict {
    pub prediction: bool,
    pub confidence: f64,
    pub model_id: String,
}

impl ClassifierVerdict {
    pub fn new(prediction: bool, confidence: f64, model_id: impl Into<String>) -> Self {
        Self {
            prediction,
            confidence: confidence.clamp(0.0, 1.0),
            model_id: model_id.into(),
        }
    }

    /// Run a classifier and turn its output into a verdict
    pub fn from_classifier(
        classifier: &dyn PoseClassifier,
        features: &FeatureVector,
        model_id: &str,
    ) -> Result<Self> {
        let prediction = classifier.predict(features)?;
        let confidence = match classifier.predict_proba(features)? {
            Some([_, p_correct]) => p_correct,
            None if prediction => FALLBACK_CONFIDENCE_CORRECT,
            None => FALLBACK_CONFIDENCE_INCORRECT,
        };
        Ok(Self::new(prediction, confidence, model_id))
    }
}

/// Standardized logistic regression, stored as JSON:
///
/// ```json
/// { "weights": [..56], "bias": -0.3, "mean": [..56], "scale": [..56] }
/// ```
///
/// `mean` and `scale` are optional; without them features are used raw.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub bias: f64,
    #[serde(default)]
    pub mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scale: Option<Vec<f64>>,
}

impl LinearModel {
    pub fn new(weights: Vec<f64>, bias: f64) -> Result<Self> {
        let model = Self {
            weights,
            bias,
            mean: None,
            scale: None,
        };
        model.validate()?;
        Ok(model)
    }

    pub fn with_standardization(mut self, mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        self.mean = Some(mean);
        self.scale = Some(scale);
        self.validate()?;
        Ok(self)
    }

    /// Load a model file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::ModelLoad(format!("{}: {}", path.display(), e)))?;
        let model: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::ModelLoad(format!("{}: {}", path.display(), e)))?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        let check = |name: &str, len: usize| {
            if len == FEATURE_DIM {
                Ok(())
            } else {
                Err(Error::Classifier(format!(
                    "{} has {} entries, expected {}",
                    name, len, FEATURE_DIM
                )))
            }
        };
        check("weights", self.weights.len())?;
        if let Some(mean) = &self.mean {
            check("mean", mean.len())?;
        }
        if let Some(scale) = &self.scale {
            check("scale", scale.len())?;
        }
        Ok(())
    }

    /// Probability that the pose is correct
    pub fn probability(&self, features: &FeatureVector) -> Result<f64> {
        let x = features.as_slice();
        if self.weights.len() != x.len() {
            return Err(Error::Classifier(format!(
                "feature length {} does not match {} weights",
                x.len(),
                self.weights.len()
            )));
        }

        let mut z = self.bias;
        for (i, (w, v)) in self.weights.iter().zip(x).enumerate() {
            let mean = self.mean.as_ref().and_then(|m| m.get(i)).copied().unwrap_or(0.0);
            let scale = self
                .scale
                .as_ref()
                .and_then(|s| s.get(i))
                .copied()
                .filter(|s| *s != 0.0)
                .unwrap_or(1.0);
            z += w * (v - mean) / scale;
        }

        Ok(sigmoid(z))
    }
}

impl PoseClassifier for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<bool> {
        Ok(self.probability(features)? >= 0.5)
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<Option<[f64; 2]>> {
        let p = self.probability(features)?;
        Ok(Some([1.0 - p, p]))
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
