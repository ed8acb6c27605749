//! Status recovery from free-text feedback.
//!
//! Used where a feedback message is the only channel available, e.g.
//! after fusion has rewritten the rule message. Error patterns are
//! checked before correct patterns so that any message mentioning a
//! problem never classifies as correct. The anatomical terms
//! ("cotovelo", "angulo", "braco") count as error signals on their own;
//! a confirmation message containing one of them would be misread.

use bodyvision_core::Status;

const ERROR_PATTERNS: &[&str] = &[
    "posicao incorreta",
    "posição incorreta",
    "incorreta",
    "erro",
    "erros",
    "nao foi possivel",
    "não foi possível",
    "muito baixo",
    "muito alto",
    "fora do intervalo",
    "cotovelo",
    "angulo",
    "braco",
];

const CORRECT_PATTERNS: &[&str] = &[
    "posicao correta",
    "posição correta",
    "correta",
    "excelente",
    "bem centralizado",
    "bem posicionado",
];

const ADJUSTMENT_PATTERNS: &[&str] = &["ajuste", "melhor"];

/// Keyword-precedence classifier for feedback messages
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusClassifier;

impl StatusClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, message: Option<&str>) -> Status {
        let Some(message) = message.filter(|m| !m.trim().is_empty()) else {
            return Status::NoDetection;
        };
        let lower = message.to_lowercase();
        let matches = |patterns: &[&str]| patterns.iter().any(|p| lower.contains(p));

        if matches(ERROR_PATTERNS) {
            Status::Incorrect
        } else if matches(CORRECT_PATTERNS) || lower.contains("centralizado") {
            Status::Correct
        } else if matches(ADJUSTMENT_PATTERNS) {
            Status::AdjustmentNeeded
        } else {
            Status::NoDetection
        }
    }
}

/// Classify a message with the default classifier
pub fn classify_status(message: &str) -> Status {
    StatusClassifier::new().classify(Some(message))
}
