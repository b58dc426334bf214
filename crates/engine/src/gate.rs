use std::fmt;

use crate::candidate::QualitySignals;
use crate::config::QualityThresholds;

/// First threshold a candidate failed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateRejection {
    LowSemantic { value: f64, min: f64 },
    LowContextual { value: f64, min: f64 },
    IntentMismatch,
}

impl fmt::Display for GateRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateRejection::LowSemantic { value, min } => {
                write!(f, "semantic relevance {value:.3} < {min:.3}")
            }
            GateRejection::LowContextual { value, min } => {
                write!(f, "contextual relevance {value:.3} < {min:.3}")
            }
            GateRejection::IntentMismatch => f.write_str("intent mismatch"),
        }
    }
}

/// Threshold filter for bridge and funnel candidates. Hierarchy candidates never
/// reach it.
#[derive(Debug, Clone, Copy)]
pub struct QualityGate {
    thresholds: QualityThresholds,
}

impl QualityGate {
    pub const fn new(thresholds: QualityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn check(&self, signals: &QualitySignals) -> Result<(), GateRejection> {
        let t = &self.thresholds;
        if signals.semantic_relevance < t.semantic_min {
            return Err(GateRejection::LowSemantic {
                value: signals.semantic_relevance,
                min: t.semantic_min,
            });
        }
        if signals.contextual_relevance < t.contextual_min {
            return Err(GateRejection::LowContextual {
                value: signals.contextual_relevance,
                min: t.contextual_min,
            });
        }
        if t.intent_required && !signals.intent_match {
            return Err(GateRejection::IntentMismatch);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::fixtures::signals;

    fn gate() -> QualityGate {
        QualityGate::new(QualityThresholds::default())
    }

    #[test]
    fn thresholds_are_inclusive() {
        assert_eq!(gate().check(&signals(0.85, 0.65)), Ok(()));
    }

    #[test]
    fn semantic_is_checked_first() {
        let rejection = gate().check(&signals(0.84, 0.10)).unwrap_err();
        assert!(matches!(rejection, GateRejection::LowSemantic { .. }));
        assert!(rejection.to_string().starts_with("semantic relevance 0.840"));
    }

    #[test]
    fn low_contextual_is_rejected() {
        let rejection = gate().check(&signals(0.95, 0.64)).unwrap_err();
        assert!(matches!(rejection, GateRejection::LowContextual { .. }));
    }

    #[test]
    fn intent_requirement_is_configurable() {
        let mut mismatched = signals(0.95, 0.9);
        mismatched.intent_match = false;
        assert_eq!(gate().check(&mismatched), Err(GateRejection::IntentMismatch));

        let relaxed = QualityGate::new(QualityThresholds {
            intent_required: false,
            ..QualityThresholds::default()
        });
        assert_eq!(relaxed.check(&mismatched), Ok(()));
    }
}
