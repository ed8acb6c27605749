//! Pose-metrics catalogue.
//!
//! Annotated pose samples (exported by the data-collection tooling)
//! carry per-pose angle ranges, textual requirements and notes. The
//! catalogue merges every sample of a pose and serves the first angle
//! range as the dynamic primary band for rule evaluation.
//!
//! A catalogue is immutable once built; reloading produces a new one.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use bodyvision_core::{Error, PoseMode, Result};
use bodyvision_rules::{AngleBand, ThresholdProvider};
use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

/// Half-width of the band built around a single `{value}` angle
pub const SINGLE_VALUE_MARGIN: f64 = 5.0;

/// Half-width of the band built around a single angle found in text
pub const TEXT_VALUE_MARGIN: f64 = 10.0;

#[derive(Debug, Deserialize)]
struct PoseSample {
    #[serde(default)]
    pose_mode: Option<String>,
    #[serde(default)]
    extracted_metrics: Option<Map<String, Value>>,
}

/// Merged metrics of one pose
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseMetrics {
    /// Named angle specs, in first-seen order
    pub angles: Map<String, Value>,
    pub requirements: Vec<String>,
    pub notes: Vec<String>,
}

impl PoseMetrics {
    fn merge(&mut self, extracted: &Map<String, Value>) {
        if let Some(Value::Object(angles)) = extracted.get("angles") {
            for (name, spec) in angles {
                self.angles.insert(name.clone(), spec.clone());
            }
        }
        append_unique(&mut self.requirements, extracted.get("requirements"));
        append_unique(&mut self.notes, extracted.get("notes"));
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty() && self.requirements.is_empty() && self.notes.is_empty()
    }

    /// Angle bands in catalogue order; malformed specs are skipped
    pub fn angle_ranges(&self) -> Vec<AngleBand> {
        self.angles.values().filter_map(band_from_spec).collect()
    }
}

fn append_unique(target: &mut Vec<String>, source: Option<&Value>) {
    let Some(Value::Array(items)) = source else {
        return;
    };
    for item in items.iter().filter_map(Value::as_str) {
        if !target.iter().any(|t| t == item) {
            target.push(item.to_string());
        }
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn band_from_spec(spec: &Value) -> Option<AngleBand> {
    let spec = spec.as_object()?;
    match (spec.get("min").and_then(number), spec.get("max").and_then(number)) {
        (Some(min), Some(max)) => Some(AngleBand::new(min, max)),
        _ => spec
            .get("value")
            .and_then(number)
            .map(|v| AngleBand::new(v - SINGLE_VALUE_MARGIN, v + SINGLE_VALUE_MARGIN)),
    }
}

#[derive(Debug, Clone, Default)]
pub struct PoseMetricsCatalog {
    source: Option<PathBuf>,
    poses: HashMap<PoseMode, PoseMetrics>,
}

impl PoseMetricsCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a catalogue, falling back to an empty one on any failure
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            warn!(
                "Pose metrics file {} not found, using built-in thresholds",
                path.display()
            );
            return Self {
                source: Some(path.to_path_buf()),
                ..Self::default()
            };
        }

        match Self::try_load(path) {
            Ok(catalog) => {
                info!("Loaded pose metrics for {} pose(s)", catalog.poses.len());
                catalog
            }
            Err(e) => {
                warn!("Failed to load pose metrics: {}, using built-in thresholds", e);
                Self {
                    source: Some(path.to_path_buf()),
                    ..Self::default()
                }
            }
        }
    }

    /// Strict load: unreadable or malformed files are errors
    pub fn try_load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Metrics(format!("{}: {}", path.display(), e)))?;
        let mut catalog = Self::from_json(&raw)?;
        catalog.source = Some(path.to_path_buf());
        Ok(catalog)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let samples: Vec<PoseSample> = serde_json::from_str(raw)
            .map_err(|e| Error::Metrics(format!("invalid pose metrics: {}", e)))?;
        Ok(Self::from_samples(samples))
    }

    fn from_samples(samples: Vec<PoseSample>) -> Self {
        let mut poses: HashMap<PoseMode, PoseMetrics> = HashMap::new();

        for sample in samples {
            let (Some(mode), Some(extracted)) = (sample.pose_mode, sample.extracted_metrics) else {
                continue;
            };
            if extracted.is_empty() {
                continue;
            }
            let Ok(mode) = mode.parse::<PoseMode>() else {
                debug!("Skipping metrics for unknown pose '{}'", mode);
                continue;
            };
            poses.entry(mode).or_default().merge(&extracted);
        }

        Self {
            source: None,
            poses,
        }
    }

    /// Re-read the file this catalogue came from
    pub fn reload(&self) -> Self {
        match &self.source {
            Some(path) => Self::load(path),
            None => self.clone(),
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn pose(&self, mode: PoseMode) -> Option<&PoseMetrics> {
        self.poses.get(&mode)
    }

    pub fn has_metrics(&self, mode: PoseMode) -> bool {
        self.pose(mode).is_some_and(|m| !m.is_empty())
    }

    pub fn requirements(&self, mode: PoseMode) -> &[String] {
        self.pose(mode).map(|m| m.requirements.as_slice()).unwrap_or(&[])
    }

    pub fn notes(&self, mode: PoseMode) -> &[String] {
        self.pose(mode).map(|m| m.notes.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }
}

impl ThresholdProvider for PoseMetricsCatalog {
    fn angle_ranges(&self, mode: PoseMode) -> Vec<AngleBand> {
        self.pose(mode).map(PoseMetrics::angle_ranges).unwrap_or_default()
    }
}

fn angle_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)(\d+)[°º]\s*[-–]\s*(\d+)[°º]",
            r"(?i)(\d+)\s*[-–]\s*(\d+)\s*graus?",
            r"(?i)~?(\d+)[°º]",
            r"(?i)(\d+)\s*graus?",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// Pull an angle band out of free text ("80° - 100°", "~90°", "90 graus")
///
/// Patterns are tried in order of specificity; a single angle becomes a
/// ±10° band.
pub fn parse_angle_from_text(text: &str) -> Option<AngleBand> {
    for pattern in angle_patterns() {
        let Some(caps) = pattern.captures(text) else {
            continue;
        };
        let value = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<f64>().ok());
        match (value(1), value(2)) {
            (Some(min), Some(max)) => return Some(AngleBand::new(min, max)),
            (Some(angle), None) => {
                return Some(AngleBand::new(
                    angle - TEXT_VALUE_MARGIN,
                    angle + TEXT_VALUE_MARGIN,
                ))
            }
            _ => continue,
        }
    }
    None
}
