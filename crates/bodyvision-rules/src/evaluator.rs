//! Per-pose rule evaluation.

use bodyvision_core::{
    AngleSet, Joint, KeypointSet, PixelPoint, PoseMode, Status, VISIBILITY_THRESHOLD,
};
use serde::{Deserialize, Serialize};

use crate::selection::{select_side, side_chest_score, side_triceps_score, Side};
use crate::thresholds::{
    DoubleBicepsThresholds, FramingThresholds, MostMuscularThresholds, PoseThresholds,
    SideChestThresholds, SideTricepsThresholds, ThresholdProvider,
};

/// Prefix of each violated constraint in an incorrect-pose message
pub const BULLET: &str = "• ";

pub const MSG_MISSING_POINTS: &str = "Nao foi possivel detectar os pontos necessarios";
pub const MSG_MISSING_SHOULDERS: &str = "Nao foi possivel detectar os ombros";
pub const MSG_MISSING_ARMS: &str = "Nao foi possivel detectar os bracos necessarios";
pub const MSG_MISSING_POSTERIOR_ARM: &str =
    "Nao foi possivel detectar o braco posterior necessario";

pub const MSG_INCORRECT_HEADER: &str = "Posicao incorreta:";
pub const MSG_CENTERED: &str = "Usuario bem centralizado na imagem.";
pub const MSG_OFF_CENTER: &str = "Centralize-se melhor na camera para avaliacao precisa.";

const MSG_DOUBLE_BICEPS_OK: &str =
    "Posicao correta - Excelente duplo bíceps! Bíceps bem definidos e simétricos.";
const MSG_SIDE_CHEST_OK: &str =
    "Posicao correta - Excelente side chest! Peito bem projetado e compressao ativa do peitoral.";
const MSG_SIDE_TRICEPS_OK: &str =
    "Posicao correta - Excelente side triceps! Triceps bem estendido e destacado.";
const MSG_MOST_MUSCULAR_OK: &str =
    "Posicao correta - Excelente most muscular! Toda a musculatura bem destacada.";

/// Verdict of the rules for one frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Confirmation sentence, bullet list of violations, or detection failure
    pub message: String,
    pub status: Status,
}

impl EvaluationResult {
    pub fn new(message: impl Into<String>, status: Status) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    /// Required joints were absent or not visible
    pub fn no_detection(message: impl Into<String>) -> Self {
        Self::new(message, Status::NoDetection)
    }

    /// Correct when nothing was violated, otherwise a bullet list
    pub fn from_violations(violations: Vec<String>, confirmation: &str) -> Self {
        if violations.is_empty() {
            return Self::new(confirmation, Status::Correct);
        }
        let mut message = String::from(MSG_INCORRECT_HEADER);
        for violation in &violations {
            message.push('\n');
            message.push_str(BULLET);
            message.push_str(violation);
        }
        Self::new(message, Status::Incorrect)
    }

    /// The violated constraints listed in the message
    pub fn violations(&self) -> impl Iterator<Item = &str> {
        self.message.lines().filter_map(|l| l.strip_prefix(BULLET))
    }

    pub fn is_correct(&self) -> bool {
        self.status == Status::Correct
    }
}

/// Judges a frame against the geometric criteria of a pose
#[derive(Debug, Clone)]
pub struct PoseRuleEvaluator {
    thresholds: PoseThresholds,
    visibility_threshold: f64,
}

impl PoseRuleEvaluator {
    pub fn new(thresholds: PoseThresholds, visibility_threshold: f64) -> Self {
        Self {
            thresholds,
            visibility_threshold,
        }
    }

    pub fn thresholds(&self) -> &PoseThresholds {
        &self.thresholds
    }

    pub fn visibility_threshold(&self) -> f64 {
        self.visibility_threshold
    }

    /// Evaluate with the hardcoded thresholds
    pub fn evaluate(
        &self,
        mode: PoseMode,
        keypoints: &KeypointSet,
        angles: &AngleSet,
        camera_width: u32,
    ) -> EvaluationResult {
        self.evaluate_with(mode, keypoints, angles, camera_width, None)
    }

    /// Evaluate, letting a dynamic provider override the primary band
    pub fn evaluate_with(
        &self,
        mode: PoseMode,
        keypoints: &KeypointSet,
        angles: &AngleSet,
        camera_width: u32,
        provider: Option<&dyn ThresholdProvider>,
    ) -> EvaluationResult {
        let resolved;
        let thresholds = match provider {
            Some(_) => {
                resolved = self.thresholds.resolve(mode, provider);
                &resolved
            }
            None => &self.thresholds,
        };

        let result = match mode {
            PoseMode::DoubleBiceps => {
                self.double_biceps(&thresholds.double_biceps, keypoints, angles)
            }
            PoseMode::SideChest => {
                self.side_chest(&thresholds.side_chest, keypoints, angles, camera_width)
            }
            PoseMode::SideTriceps => {
                self.side_triceps(&thresholds.side_triceps, keypoints, angles, camera_width)
            }
            PoseMode::MostMuscular => {
                self.most_muscular(&thresholds.most_muscular, keypoints, angles)
            }
            PoseMode::Enquadramento => self.framing(&thresholds.framing, keypoints, camera_width),
        };

        tracing::debug!("Evaluated {}: {}", mode, result.status);
        result
    }

    fn visible<'a>(&self, keypoints: &'a KeypointSet, joint: Joint) -> Option<&'a PixelPoint> {
        keypoints.visible(joint, self.visibility_threshold)
    }

    /// Arm angle of a side, if computed and its elbow and wrist are visible
    fn arm_angle(&self, keypoints: &KeypointSet, angles: &AngleSet, side: Side) -> Option<f64> {
        let angle = angles.get(side.arm_angle()).filter(|a| *a > 0.0)?;
        self.visible(keypoints, side.elbow())?;
        self.visible(keypoints, side.wrist())?;
        Some(angle)
    }

    /// Pixel x-separation of the hips, 0 unless both are visible
    fn hip_rotation(&self, keypoints: &KeypointSet) -> f64 {
        match (
            self.visible(keypoints, Joint::LeftHip),
            self.visible(keypoints, Joint::RightHip),
        ) {
            (Some(l), Some(r)) => (l.x - r.x).abs() as f64,
            _ => 0.0,
        }
    }

    fn double_biceps(
        &self,
        t: &DoubleBicepsThresholds,
        keypoints: &KeypointSet,
        angles: &AngleSet,
    ) -> EvaluationResult {
        let (Some(left_elbow), Some(right_elbow), Some(left_shoulder), Some(right_shoulder)) = (
            self.visible(keypoints, Joint::LeftElbow),
            self.visible(keypoints, Joint::RightElbow),
            self.visible(keypoints, Joint::LeftShoulder),
            self.visible(keypoints, Joint::RightShoulder),
        ) else {
            return EvaluationResult::no_detection(MSG_MISSING_POINTS);
        };

        let mut violations = Vec::new();

        // y grows downward: a larger elbow y is lower than the shoulder
        if left_elbow.y > left_shoulder.y {
            violations.push(
                "Cotovelo esquerdo muito baixo - eleve acima ou na altura do ombro".to_string(),
            );
        }
        if right_elbow.y > right_shoulder.y {
            violations.push(
                "Cotovelo direito muito baixo - eleve acima ou na altura do ombro".to_string(),
            );
        }

        for (side, label) in [(Side::Left, "esquerdo"), (Side::Right, "direito")] {
            let angle = angles.or_zero(side.arm_angle());
            if !t.arm.contains(angle) {
                violations.push(format!(
                    "Angulo do braco {} fora do intervalo ({:.0}-{:.0} graus, atual: {:.0}°)",
                    label, t.arm.min, t.arm.max, angle
                ));
            }
        }

        EvaluationResult::from_violations(violations, MSG_DOUBLE_BICEPS_OK)
    }

    fn framing(
        &self,
        t: &FramingThresholds,
        keypoints: &KeypointSet,
        camera_width: u32,
    ) -> EvaluationResult {
        // Presence only; framing does not gate on visibility
        let (Some(left), Some(right)) = (
            keypoints.get(Joint::LeftShoulder),
            keypoints.get(Joint::RightShoulder),
        ) else {
            return EvaluationResult::no_detection(MSG_MISSING_POINTS);
        };

        let center_x = i64::from(camera_width).div_euclid(2);
        let body_center_x = (i64::from(left.x) + i64::from(right.x)).div_euclid(2);
        let offset = (center_x - body_center_x).abs() as f64;

        if offset < camera_width as f64 * t.max_center_offset_ratio {
            EvaluationResult::new(MSG_CENTERED, Status::Correct)
        } else {
            EvaluationResult::new(MSG_OFF_CENTER, Status::AdjustmentNeeded)
        }
    }

    fn side_chest(
        &self,
        t: &SideChestThresholds,
        keypoints: &KeypointSet,
        angles: &AngleSet,
        camera_width: u32,
    ) -> EvaluationResult {
        let (Some(left_shoulder), Some(right_shoulder)) = (
            self.visible(keypoints, Joint::LeftShoulder),
            self.visible(keypoints, Joint::RightShoulder),
        ) else {
            return EvaluationResult::no_detection(MSG_MISSING_SHOULDERS);
        };

        let left_arm = self.arm_angle(keypoints, angles, Side::Left);
        let right_arm = self.arm_angle(keypoints, angles, Side::Right);
        if left_arm.is_none() && right_arm.is_none() {
            return EvaluationResult::no_detection(MSG_MISSING_ARMS);
        }

        let width = camera_width as f64;
        let front = select_side(
            left_arm.map(|a| side_chest_score(a, left_shoulder.x as f64, width)),
            right_arm.map(|a| side_chest_score(a, right_shoulder.x as f64, width)),
        );
        let Some(front) = front else {
            return EvaluationResult::no_detection(MSG_MISSING_ARMS);
        };

        let (front_arm, opposite_arm) = match front {
            Side::Left => (left_arm, right_arm),
            Side::Right => (right_arm, left_arm),
        };
        let (Some(front_angle), Some(elbow), Some(shoulder)) = (
            front_arm,
            keypoints.get(front.elbow()),
            keypoints.get(front.shoulder()),
        ) else {
            return EvaluationResult::no_detection(MSG_MISSING_ARMS);
        };
        let front_knee = angles.get(front.knee_angle()).filter(|a| *a > 0.0);
        let hip_rotation = self.hip_rotation(keypoints);

        let mut violations = Vec::new();

        if !t.frontal_arm.contains(front_angle) {
            violations.push(format!(
                "Braco frontal deve estar contraido entre {:.0}-{:.0}° (atual: {:.0}°)",
                t.frontal_arm.min, t.frontal_arm.max, front_angle
            ));
        }

        if hip_rotation > 0.0 && hip_rotation < t.min_hip_rotation {
            violations.push(
                "Gire o tronco para o lado (~80-85°) para melhor visualizacao do peito".to_string(),
            );
        }

        if elbow.y > 0 && shoulder.y > 0 && f64::from(elbow.y - shoulder.y) < -t.max_elbow_rise {
            violations.push("Cotovelo muito acima do ombro - abaixe para mostrar o peito".to_string());
        }

        if let Some(knee) = front_knee {
            if knee < t.knee.min {
                violations.push(format!(
                    "Joelho muito flexionado - estenda ligeiramente para ~165-170° (atual: {:.0}°)",
                    knee
                ));
            } else if knee > t.knee.max {
                violations.push(format!(
                    "Joelho muito estendido - flexione ligeiramente para ~165-170° (atual: {:.0}°)",
                    knee
                ));
            }
        }

        if opposite_arm.is_some_and(|a| a > t.max_posterior_arm) {
            violations
                .push("Mantenha o braco posterior flexionado para comprimir o peitoral".to_string());
        }

        EvaluationResult::from_violations(violations, MSG_SIDE_CHEST_OK)
    }

    fn side_triceps(
        &self,
        t: &SideTricepsThresholds,
        keypoints: &KeypointSet,
        angles: &AngleSet,
        camera_width: u32,
    ) -> EvaluationResult {
        let (Some(left_shoulder), Some(right_shoulder)) = (
            self.visible(keypoints, Joint::LeftShoulder),
            self.visible(keypoints, Joint::RightShoulder),
        ) else {
            return EvaluationResult::no_detection(MSG_MISSING_SHOULDERS);
        };

        let left_arm = self.arm_angle(keypoints, angles, Side::Left);
        let right_arm = self.arm_angle(keypoints, angles, Side::Right);
        if left_arm.is_none() && right_arm.is_none() {
            return EvaluationResult::no_detection(MSG_MISSING_ARMS);
        }

        let width = camera_width as f64;
        let posterior = select_side(
            left_arm.map(|a| side_triceps_score(a, left_shoulder.x as f64, width)),
            right_arm.map(|a| side_triceps_score(a, right_shoulder.x as f64, width)),
        );
        let Some(posterior) = posterior else {
            return EvaluationResult::no_detection(MSG_MISSING_POSTERIOR_ARM);
        };

        let (posterior_arm, front_arm) = match posterior {
            Side::Left => (left_arm, right_arm),
            Side::Right => (right_arm, left_arm),
        };
        let (Some(posterior_angle), Some(elbow), Some(shoulder)) = (
            posterior_arm,
            keypoints.get(posterior.elbow()),
            keypoints.get(posterior.shoulder()),
        ) else {
            return EvaluationResult::no_detection(MSG_MISSING_POSTERIOR_ARM);
        };
        let front_knee = angles
            .get(posterior.opposite().knee_angle())
            .filter(|a| *a > 0.0);
        let hip_rotation = self.hip_rotation(keypoints);

        // The front arm holds the posterior wrist; it is not judged
        if let Some(front_angle) = front_arm {
            tracing::trace!("Side triceps front arm at {:.0}°", front_angle);
        }

        let mut violations = Vec::new();

        if posterior_angle < t.posterior_arm.min {
            violations.push(format!(
                "Braco posterior deve estar estendido (~{:.0}-{:.0}°) (atual: {:.0}°)",
                t.posterior_arm.min, t.posterior_arm.max, posterior_angle
            ));
        }

        if elbow.y > 0 && shoulder.y > 0 && f64::from(elbow.y - shoulder.y) < -t.max_elbow_rise {
            violations.push(
                "Cotovelo posterior muito acima do ombro - abaixe para mostrar o triceps corretamente"
                    .to_string(),
            );
        }

        if hip_rotation > 0.0 && hip_rotation < t.min_hip_rotation {
            violations.push(
                "Gire o tronco para o lado (~85-90°) para melhor visualizacao do triceps"
                    .to_string(),
            );
        }

        if let Some(knee) = front_knee {
            if !t.front_knee.contains(knee) {
                violations.push(format!(
                    "Joelho da perna frontal deve estar estendido (~180°) (atual: {:.0}°)",
                    knee
                ));
            }
        }

        EvaluationResult::from_violations(violations, MSG_SIDE_TRICEPS_OK)
    }

    fn most_muscular(
        &self,
        t: &MostMuscularThresholds,
        keypoints: &KeypointSet,
        angles: &AngleSet,
    ) -> EvaluationResult {
        // Presence only: this pose has never gated on visibility
        let (
            Some(left_elbow),
            Some(right_elbow),
            Some(left_shoulder),
            Some(right_shoulder),
            Some(left_wrist),
            Some(right_wrist),
        ) = (
            keypoints.get(Joint::LeftElbow),
            keypoints.get(Joint::RightElbow),
            keypoints.get(Joint::LeftShoulder),
            keypoints.get(Joint::RightShoulder),
            keypoints.get(Joint::LeftWrist),
            keypoints.get(Joint::RightWrist),
        )
        else {
            return EvaluationResult::no_detection(MSG_MISSING_POINTS);
        };

        let shoulder_width = f64::from((right_shoulder.x - left_shoulder.x).abs());
        let wrist_distance = f64::from((left_wrist.x - right_wrist.x).abs());

        let torso_alignment = match (keypoints.get(Joint::LeftHip), keypoints.get(Joint::RightHip)) {
            (Some(left_hip), Some(right_hip)) => f64::from(
                ((left_shoulder.y - left_hip.y) - (right_shoulder.y - right_hip.y)).abs(),
            ),
            _ => 0.0,
        };

        let knee = |side: Side| {
            angles
                .get(side.knee_angle())
                .filter(|a| *a > 0.0)
                .unwrap_or(t.missing_knee)
        };

        let mut violations = Vec::new();

        if f64::from(left_elbow.y) <= f64::from(left_shoulder.y) + t.min_elbow_drop {
            violations.push("Cotovelo esquerdo deve estar abaixo do ombro".to_string());
        }
        if f64::from(right_elbow.y) <= f64::from(right_shoulder.y) + t.min_elbow_drop {
            violations.push("Cotovelo direito deve estar abaixo do ombro".to_string());
        }

        if shoulder_width > 0.0 && wrist_distance > shoulder_width * t.max_wrist_ratio {
            violations.push(
                "Aproxime as maos - bracos devem estar contraidos um contra o outro".to_string(),
            );
        }

        if torso_alignment > t.max_torso_misalignment {
            violations.push("Mantenha o torso alinhado para mostrar simetria".to_string());
        }

        for (side, label) in [(Side::Left, "esquerda"), (Side::Right, "direita")] {
            let angle = knee(side);
            if angle < t.min_knee {
                violations.push(format!("Estenda mais a perna {} (atual: {:.0}°)", label, angle));
            }
        }

        EvaluationResult::from_violations(violations, MSG_MOST_MUSCULAR_OK)
    }
}

impl Default for PoseRuleEvaluator {
    fn default() -> Self {
        Self::new(PoseThresholds::default(), VISIBILITY_THRESHOLD)
    }
}
