//! Rule / classifier fusion.
//!
//! A classifier verdict at or above the confidence threshold decides
//! correctness; below it the rules decide and the classifier only
//! annotates the message.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::ClassifierVerdict;

pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Which source decided the fused verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    RulesOnly,
    MlHighConfidence,
    RulesPrioritized,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RulesOnly => "rules_only",
            Self::MlHighConfidence => "ml_high_confidence",
            Self::RulesPrioritized => "rules_prioritized",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedFeedback {
    pub message: String,
    pub is_correct: bool,
    pub provenance: Provenance,
    pub ml_confidence: Option<f64>,
    pub ml_prediction: Option<bool>,
    pub rule_message: Option<String>,
}

/// Whether a rule message reports success
///
/// Plain substring match on "correta" or "centralizado". "incorreta"
/// contains "correta", so an incorrect-pose message also matches.
pub fn rule_is_correct(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("correta") || lower.contains("centralizado")
}

#[derive(Debug, Clone, Copy)]
pub struct FusionEngine {
    confidence_threshold: f64,
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIDENCE_THRESHOLD)
    }
}

impl FusionEngine {
    pub fn new(confidence_threshold: f64) -> Self {
        Self {
            confidence_threshold: confidence_threshold.clamp(0.0, 1.0),
        }
    }

    pub fn confidence_threshold(&self) -> f64 {
        self.confidence_threshold
    }

    pub fn fuse(&self, rule_message: &str, verdict: Option<&ClassifierVerdict>) -> FusedFeedback {
        let rule_correct = rule_is_correct(rule_message);

        let Some(verdict) = verdict else {
            return FusedFeedback {
                message: rule_message.to_string(),
                is_correct: rule_correct,
                provenance: Provenance::RulesOnly,
                ml_confidence: None,
                ml_prediction: None,
                rule_message: None,
            };
        };

        let ml_correct = verdict.prediction;
        let confidence = verdict.confidence;

        let (message, is_correct, provenance) = if confidence >= self.confidence_threshold {
            let message = match (ml_correct, rule_correct) {
                (true, true) => format!("✅ [ML] {}", rule_message),
                (true, false) => "✅ [ML] Posição correta".to_string(),
                (false, false) => format!("❌ [ML] {}", rule_message),
                (false, true) => "❌ [ML] Ajuste necessário".to_string(),
            };
            (message, ml_correct, Provenance::MlHighConfidence)
        } else {
            let message = match (rule_correct, ml_correct) {
                (true, true) => format!("✅ [✓ML] {}", rule_message),
                (false, false) => format!("❌ [✗ML] {}", rule_message),
                _ => format!(
                    "{} [ML:{} conf:{:.0}%]",
                    rule_message,
                    if ml_correct { "✓" } else { "✗" },
                    confidence * 100.0
                ),
            };
            (message, rule_correct, Provenance::RulesPrioritized)
        };

        debug!(
            "Fused via {} (model {}, confidence {:.2})",
            provenance.as_str(),
            verdict.model_id,
            confidence
        );

        FusedFeedback {
            message,
            is_correct,
            provenance,
            ml_confidence: Some(confidence),
            ml_prediction: Some(ml_correct),
            rule_message: Some(rule_message.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULE_OK: &str = "Posicao correta - Excelente side chest!";
    const RULE_BAD: &str = "Posicao incorreta:\n• Cotovelo direito muito baixo";
    const RULE_UNDETECTED: &str = "Nao foi possivel detectar os ombros";

    fn verdict(prediction: bool, confidence: f64) -> ClassifierVerdict {
        ClassifierVerdict::new(prediction, confidence, "general")
    }

    #[test]
    fn test_rule_is_correct() {
        assert!(rule_is_correct(RULE_OK));
        assert!(rule_is_correct("Usuario bem centralizado na imagem."));
        assert!(!rule_is_correct(RULE_UNDETECTED));
        assert!(!rule_is_correct("Centralize-se melhor na camera"));
    }

    #[test]
    fn test_incorrect_message_matches_correta() {
        // "incorreta" contains "correta"
        assert!(rule_is_correct(RULE_BAD));
        let fused = FusionEngine::default().fuse(RULE_BAD, None);
        assert!(fused.is_correct);
    }

    #[test]
    fn test_no_verdict_is_rules_only() {
        let fused = FusionEngine::default().fuse(RULE_UNDETECTED, None);
        assert_eq!(fused.provenance, Provenance::RulesOnly);
        assert_eq!(fused.message, RULE_UNDETECTED);
        assert!(!fused.is_correct);
        assert!(fused.ml_confidence.is_none());
        assert!(fused.rule_message.is_none());
    }

    #[test]
    fn test_high_confidence_ml_overrides_rules() {
        let fused = FusionEngine::default().fuse(RULE_UNDETECTED, Some(&verdict(true, 0.9)));
        assert_eq!(fused.provenance, Provenance::MlHighConfidence);
        assert!(fused.is_correct);
        assert_eq!(fused.message, "✅ [ML] Posição correta");
        assert_eq!(fused.rule_message.as_deref(), Some(RULE_UNDETECTED));
    }

    #[test]
    fn test_high_confidence_agreement_keeps_rule_text() {
        let engine = FusionEngine::default();

        let fused = engine.fuse(RULE_OK, Some(&verdict(true, 0.95)));
        assert_eq!(fused.message, format!("✅ [ML] {}", RULE_OK));

        let fused = engine.fuse(RULE_UNDETECTED, Some(&verdict(false, 0.7)));
        assert_eq!(fused.message, format!("❌ [ML] {}", RULE_UNDETECTED));
        assert!(!fused.is_correct);
    }

    #[test]
    fn test_high_confidence_rejection_of_correct_rule() {
        let engine = FusionEngine::default();

        let fused = engine.fuse(RULE_OK, Some(&verdict(false, 0.8)));
        assert_eq!(fused.message, "❌ [ML] Ajuste necessário");
        assert!(!fused.is_correct);

        // an incorrect-pose message reads as correct, so it is replaced too
        let fused = engine.fuse(RULE_BAD, Some(&verdict(false, 0.8)));
        assert_eq!(fused.message, "❌ [ML] Ajuste necessário");
    }

    #[test]
    fn test_low_confidence_disagreement_follows_rules() {
        let fused = FusionEngine::default().fuse(RULE_OK, Some(&verdict(false, 0.5)));
        assert_eq!(fused.provenance, Provenance::RulesPrioritized);
        assert!(fused.is_correct);
        assert!(fused.message.contains("[ML:✗ conf:50%]"));
        assert!(fused.message.starts_with(RULE_OK));
        assert_eq!(fused.ml_prediction, Some(false));
    }

    #[test]
    fn test_low_confidence_agreement_markers() {
        let engine = FusionEngine::default();

        let fused = engine.fuse(RULE_OK, Some(&verdict(true, 0.6)));
        assert_eq!(fused.message, format!("✅ [✓ML] {}", RULE_OK));

        let fused = engine.fuse(RULE_UNDETECTED, Some(&verdict(false, 0.3)));
        assert_eq!(fused.message, format!("❌ [✗ML] {}", RULE_UNDETECTED));
        assert!(!fused.is_correct);
    }

    #[test]
    fn test_low_confidence_incorrect_message_diverges() {
        let fused = FusionEngine::default().fuse(RULE_BAD, Some(&verdict(false, 0.3)));
        assert_eq!(fused.message, format!("{} [ML:✗ conf:30%]", RULE_BAD));
        assert!(fused.is_correct);
    }

    #[test]
    fn test_low_confidence_positive_disagreement() {
        let fused = FusionEngine::default().fuse(RULE_UNDETECTED, Some(&verdict(true, 0.64)));
        assert!(fused.message.ends_with("[ML:✓ conf:64%]"));
        assert!(!fused.is_correct);
    }

    #[test]
    fn test_confidence_percentage_rounding() {
        let engine = FusionEngine::default();
        let fused = engine.fuse(RULE_UNDETECTED, Some(&verdict(true, 0.645)));
        assert!(fused.message.ends_with("conf:64%]"));
        let fused = engine.fuse(RULE_UNDETECTED, Some(&verdict(true, 0.125)));
        assert!(fused.message.ends_with("conf:12%]"));
    }

    #[test]
    fn test_custom_threshold() {
        let engine = FusionEngine::new(0.95);
        let fused = engine.fuse(RULE_UNDETECTED, Some(&verdict(true, 0.9)));
        assert_eq!(fused.provenance, Provenance::RulesPrioritized);
        assert!(!fused.is_correct);
    }

    #[test]
    fn test_provenance_serializes_snake_case() {
        let json = serde_json::to_string(&Provenance::MlHighConfidence).unwrap();
        assert_eq!(json, "\"ml_high_confidence\"");
    }
}
