use std::fmt;

use crate::candidate::{QualitySignals, ResolvedCandidate, ScoredCandidate};
use crate::config::ScoringWeights;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreRejection {
    /// Hierarchy candidates carry no signals and are never scored.
    Unscored,
    BelowFloor { confidence: f64, min: f64 },
}

impl fmt::Display for ScoreRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreRejection::Unscored => f.write_str("candidate carries no quality signals"),
            ScoreRejection::BelowFloor { confidence, min } => {
                write!(f, "confidence {confidence:.3} < {min:.3}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConfidenceScorer {
    weights: ScoringWeights,
    confidence_min: f64,
}

impl ConfidenceScorer {
    pub const fn new(weights: ScoringWeights, confidence_min: f64) -> Self {
        Self {
            weights,
            confidence_min,
        }
    }

    /// Weighted blend of the signals, clamped to `[0, 1]`.
    pub fn confidence(&self, signals: &QualitySignals) -> f64 {
        let w = &self.weights;
        let mut score = w.semantic * signals.semantic_relevance
            + w.contextual * signals.contextual_relevance;
        if signals.intent_match {
            score += w.intent;
        }
        if signals.journey_bonus {
            score += w.journey_bonus;
        }
        if signals.outlier_penalty {
            score -= w.outlier_penalty;
        }
        score.clamp(0.0, 1.0)
    }

    pub fn score(&self, candidate: ResolvedCandidate) -> Result<ScoredCandidate, ScoreRejection> {
        let Some(signals) = candidate.body.kind.signals().copied() else {
            return Err(ScoreRejection::Unscored);
        };
        let confidence = self.confidence(&signals);
        if confidence < self.confidence_min {
            return Err(ScoreRejection::BelowFloor {
                confidence,
                min: self.confidence_min,
            });
        }
        Ok(ScoredCandidate {
            candidate,
            confidence,
            priority: signals.priority.unwrap_or_else(|| derive_priority(confidence)),
        })
    }
}

/// Priority derived from a confidence in `[0, 1]`.
pub fn derive_priority(confidence: f64) -> i32 {
    (confidence * 100.0).round() as i32
}
