use std::cmp::Ordering;

use sitelink_protocol::{FunnelStage, LinkSource, LinkType, PageRef, ResolutionMethod};

/// Quality inputs carried by bridge and funnel candidates, validated and normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualitySignals {
    pub semantic_relevance: f64,
    pub contextual_relevance: f64,
    pub intent_match: bool,
    pub journey_bonus: bool,
    pub outlier_penalty: bool,
    /// Upstream-supplied priority; derived from confidence when absent.
    pub priority: Option<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CandidateKind {
    Hierarchy,
    Bridge(QualitySignals),
    Funnel {
        signals: QualitySignals,
        stage: Option<FunnelStage>,
    },
}

impl CandidateKind {
    pub const fn link_type(&self) -> LinkType {
        match self {
            CandidateKind::Hierarchy => LinkType::Hierarchy,
            CandidateKind::Bridge(_) => LinkType::Bridge,
            CandidateKind::Funnel { .. } => LinkType::Funnel,
        }
    }

    pub const fn signals(&self) -> Option<&QualitySignals> {
        match self {
            CandidateKind::Hierarchy => None,
            CandidateKind::Bridge(signals) | CandidateKind::Funnel { signals, .. } => {
                Some(signals)
            }
        }
    }

    pub const fn funnel_stage(&self) -> Option<FunnelStage> {
        match self {
            CandidateKind::Funnel { stage, .. } => *stage,
            _ => None,
        }
    }
}

/// Fields that travel unchanged from collection to the final record.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateBody {
    pub kind: CandidateKind,
    /// Stream the candidate came from; survives reclassification.
    pub source: LinkSource,
    pub anchor_text: String,
    pub placement: Vec<String>,
}

impl CandidateBody {
    pub fn new(kind: CandidateKind, anchor_text: String, placement: Vec<String>) -> Self {
        let source = kind.link_type().source();
        Self {
            kind,
            source,
            anchor_text,
            placement,
        }
    }
}

/// A validated candidate whose endpoints are still symbolic.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCandidate {
    pub from_ref: PageRef,
    pub to_ref: PageRef,
    pub body: CandidateBody,
}

impl RawCandidate {
    pub const fn link_type(&self) -> LinkType {
        self.body.kind.link_type()
    }
}

/// A candidate with both endpoints mapped onto catalog pages.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCandidate {
    pub from_page_id: String,
    pub to_page_id: String,
    /// Weaker of the two endpoint resolution methods.
    pub resolution_method: ResolutionMethod,
    pub body: CandidateBody,
}

impl ResolvedCandidate {
    pub const fn link_type(&self) -> LinkType {
        self.body.kind.link_type()
    }

    pub fn pair(&self) -> (&str, &str) {
        (&self.from_page_id, &self.to_page_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: ResolvedCandidate,
    pub confidence: f64,
    pub priority: i32,
}

impl ScoredCandidate {
    pub const fn link_type(&self) -> LinkType {
        self.candidate.link_type()
    }

    pub fn pair(&self) -> (&str, &str) {
        self.candidate.pair()
    }

    /// Same pair, now treated as structural navigation. Confidence is kept.
    #[must_use]
    pub fn into_hierarchy(mut self) -> Self {
        self.candidate.body.kind = CandidateKind::Hierarchy;
        self
    }

    /// Selection order: priority desc, confidence desc, then pair ascending.
    pub fn selection_cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.confidence.total_cmp(&self.confidence))
            .then_with(|| self.pair().cmp(&other.pair()))
    }

    /// Duplicate resolution order: confidence desc, then priority desc.
    pub fn dedup_cmp(&self, other: &Self) -> Ordering {
        other
            .confidence
            .total_cmp(&self.confidence)
            .then_with(|| other.priority.cmp(&self.priority))
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn signals(semantic: f64, contextual: f64) -> QualitySignals {
        QualitySignals {
            semantic_relevance: semantic,
            contextual_relevance: contextual,
            intent_match: true,
            journey_bonus: false,
            outlier_penalty: false,
            priority: None,
        }
    }

    pub fn resolved(link_type: LinkType, from: &str, to: &str) -> ResolvedCandidate {
        let kind = match link_type {
            LinkType::Hierarchy => CandidateKind::Hierarchy,
            LinkType::Bridge => CandidateKind::Bridge(signals(0.9, 0.9)),
            LinkType::Funnel => CandidateKind::Funnel {
                signals: signals(0.9, 0.9),
                stage: None,
            },
        };
        ResolvedCandidate {
            from_page_id: from.to_string(),
            to_page_id: to.to_string(),
            resolution_method: ResolutionMethod::PathExact,
            body: CandidateBody::new(kind, format!("{from} -> {to}"), Vec::new()),
        }
    }

    /// Scored candidate whose priority is derived from confidence.
    pub fn scored(link_type: LinkType, from: &str, to: &str, confidence: f64) -> ScoredCandidate {
        ScoredCandidate {
            candidate: resolved(link_type, from, to),
            confidence,
            priority: (confidence * 100.0).round() as i32,
        }
    }
}
