//! Geometric thresholds for each pose mode.

use bodyvision_core::PoseMode;
use serde::{Deserialize, Serialize};

/// Closed angle interval in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleBand {
    pub min: f64,
    pub max: f64,
}

impl AngleBand {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, angle: f64) -> bool {
        self.min <= angle && angle <= self.max
    }

    /// Finite bounds with min <= max
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }
}

/// Source of per-pose angle ranges that may override hardcoded bands
///
/// Implementations are read-only; a reload produces a new provider.
pub trait ThresholdProvider: Send + Sync {
    /// Ordered angle ranges known for a pose
    fn angle_ranges(&self, mode: PoseMode) -> Vec<AngleBand>;

    /// The range that overrides the pose's primary band
    fn primary_angle_range(&self, mode: PoseMode) -> Option<AngleBand> {
        self.angle_ranges(mode).into_iter().next()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoubleBicepsThresholds {
    /// Elbow flexion showing the biceps peak
    pub arm: AngleBand,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideChestThresholds {
    /// Frontal arm flexion
    pub frontal_arm: AngleBand,
    /// Pixels the frontal elbow may sit above its shoulder
    pub max_elbow_rise: f64,
    /// Frontal knee, slightly flexed
    pub knee: AngleBand,
    /// Hip x-separation (px) below which the torso is not rotated enough
    pub min_hip_rotation: f64,
    /// Posterior arm angle above which it counts as extended
    pub max_posterior_arm: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideTricepsThresholds {
    /// Posterior arm extension; only the lower bound is enforced
    pub posterior_arm: AngleBand,
    /// Pixels the posterior elbow may sit above its shoulder
    pub max_elbow_rise: f64,
    pub front_knee: AngleBand,
    pub min_hip_rotation: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MostMuscularThresholds {
    /// Pixels each elbow must sit below its shoulder
    pub min_elbow_drop: f64,
    /// Maximum wrist distance as a fraction of shoulder width
    pub max_wrist_ratio: f64,
    /// Maximum difference between left and right shoulder-hip offsets
    pub max_torso_misalignment: f64,
    pub min_knee: f64,
    /// Knee angle assumed when it could not be computed
    pub missing_knee: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FramingThresholds {
    /// Allowed body-center offset as a fraction of camera width
    pub max_center_offset_ratio: f64,
}

/// Complete threshold table used by the rule evaluator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseThresholds {
    pub double_biceps: DoubleBicepsThresholds,
    pub side_chest: SideChestThresholds,
    pub side_triceps: SideTricepsThresholds,
    pub most_muscular: MostMuscularThresholds,
    pub framing: FramingThresholds,
}

impl Default for PoseThresholds {
    fn default() -> Self {
        Self {
            double_biceps: DoubleBicepsThresholds {
                arm: AngleBand::new(30.0, 80.0),
            },
            side_chest: SideChestThresholds {
                frontal_arm: AngleBand::new(70.0, 130.0),
                max_elbow_rise: 30.0,
                knee: AngleBand::new(160.0, 175.0),
                min_hip_rotation: 10.0,
                max_posterior_arm: 160.0,
            },
            side_triceps: SideTricepsThresholds {
                posterior_arm: AngleBand::new(120.0, 180.0),
                max_elbow_rise: 50.0,
                front_knee: AngleBand::new(170.0, 180.0),
                min_hip_rotation: 10.0,
            },
            most_muscular: MostMuscularThresholds {
                min_elbow_drop: 10.0,
                max_wrist_ratio: 0.5,
                max_torso_misalignment: 30.0,
                min_knee: 160.0,
                missing_knee: 175.0,
            },
            framing: FramingThresholds {
                max_center_offset_ratio: 0.1,
            },
        }
    }
}

impl PoseThresholds {
    /// The band a dynamic override replaces, if the pose has one
    pub fn primary_band(&self, mode: PoseMode) -> Option<AngleBand> {
        match mode {
            PoseMode::DoubleBiceps => Some(self.double_biceps.arm),
            PoseMode::SideChest => Some(self.side_chest.frontal_arm),
            PoseMode::SideTriceps => Some(self.side_triceps.posterior_arm),
            PoseMode::MostMuscular | PoseMode::Enquadramento => None,
        }
    }

    /// Replace the primary band of a pose; invalid bands are ignored
    pub fn with_primary_band(mut self, mode: PoseMode, band: AngleBand) -> Self {
        if !band.is_valid() {
            tracing::debug!("Ignoring invalid {} angle override {:?}", mode, band);
            return self;
        }
        match mode {
            PoseMode::DoubleBiceps => self.double_biceps.arm = band,
            PoseMode::SideChest => self.side_chest.frontal_arm = band,
            PoseMode::SideTriceps => self.side_triceps.posterior_arm = band,
            PoseMode::MostMuscular | PoseMode::Enquadramento => {}
        }
        self
    }

    /// Thresholds for one evaluation, after consulting the provider
    pub fn resolve(&self, mode: PoseMode, provider: Option<&dyn ThresholdProvider>) -> Self {
        let Some(band) = provider.and_then(|p| p.primary_angle_range(mode)) else {
            return self.clone();
        };
        if self.primary_band(mode).is_some() {
            tracing::debug!(
                "Using dynamic {} angle band {:.0}-{:.0}",
                mode,
                band.min,
                band.max
            );
        }
        self.clone().with_primary_band(mode, band)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRanges(Vec<AngleBand>);

    impl ThresholdProvider for FixedRanges {
        fn angle_ranges(&self, _mode: PoseMode) -> Vec<AngleBand> {
            self.0.clone()
        }
    }

    #[test]
    fn test_band_contains_is_inclusive() {
        let band = AngleBand::new(30.0, 80.0);
        assert!(band.contains(30.0));
        assert!(band.contains(80.0));
        assert!(!band.contains(80.01));
        assert!(!band.contains(29.99));
    }

    #[test]
    fn test_resolve_without_provider_keeps_defaults() {
        let base = PoseThresholds::default();
        let resolved = base.resolve(PoseMode::SideChest, None);
        assert_eq!(resolved.side_chest.frontal_arm, AngleBand::new(70.0, 130.0));
    }

    #[test]
    fn test_resolve_uses_first_range() {
        let provider = FixedRanges(vec![AngleBand::new(80.0, 100.0), AngleBand::new(0.0, 10.0)]);
        let resolved = PoseThresholds::default().resolve(PoseMode::SideChest, Some(&provider));
        assert_eq!(resolved.side_chest.frontal_arm, AngleBand::new(80.0, 100.0));
        assert_eq!(resolved.double_biceps.arm, AngleBand::new(30.0, 80.0));
    }

    #[test]
    fn test_resolve_empty_provider_keeps_defaults() {
        let provider = FixedRanges(Vec::new());
        let resolved = PoseThresholds::default().resolve(PoseMode::DoubleBiceps, Some(&provider));
        assert_eq!(resolved.double_biceps.arm, AngleBand::new(30.0, 80.0));
    }

    #[test]
    fn test_invalid_override_ignored() {
        let resolved =
            PoseThresholds::default().with_primary_band(PoseMode::SideTriceps, AngleBand::new(150.0, 90.0));
        assert_eq!(resolved.side_triceps.posterior_arm, AngleBand::new(120.0, 180.0));
    }

    #[test]
    fn test_most_muscular_has_no_primary_band() {
        let base = PoseThresholds::default();
        assert!(base.primary_band(PoseMode::MostMuscular).is_none());
        assert!(base.primary_band(PoseMode::Enquadramento).is_none());
    }
}
