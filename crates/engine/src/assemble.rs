use std::collections::HashSet;
use std::fmt::Write as _;

use sha2::{Digest, Sha256};
use sitelink_protocol::{
    FunnelStage, LinkRecord, LinkStats, LinkType, TypeCounts, HIERARCHY_PRIORITY,
};
use sitelink_resolver::PageCatalog;

use crate::candidate::{ResolvedCandidate, ScoredCandidate};
use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembled {
    pub links: Vec<LinkRecord>,
    /// Records dropped by the final `(from, to, type)` pass.
    pub final_duplicates: usize,
}

/// Turns the surviving candidates of one run into output records.
pub struct LinkSetAssembler<'a> {
    architecture_id: &'a str,
    catalog: &'a PageCatalog,
}

impl<'a> LinkSetAssembler<'a> {
    pub fn new(architecture_id: &'a str, catalog: &'a PageCatalog) -> Self {
        Self {
            architecture_id,
            catalog,
        }
    }

    /// Hierarchy links first (upstream ones, then reclassified bridges), then the
    /// selection in its own order. The first occurrence of a triple wins.
    pub fn assemble(
        &self,
        hierarchy: Vec<ResolvedCandidate>,
        reclassified: Vec<ScoredCandidate>,
        selected: Vec<ScoredCandidate>,
    ) -> Assembled {
        let records = hierarchy
            .into_iter()
            .map(|candidate| self.hierarchy_record(candidate))
            .chain(
                reclassified
                    .into_iter()
                    .map(|scored| self.reclassified_record(scored)),
            )
            .chain(selected.into_iter().map(|scored| self.selected_record(scored)));

        let mut seen: HashSet<(String, String, LinkType)> = HashSet::new();
        let mut links = Vec::new();
        let mut final_duplicates = 0;
        for record in records {
            let key = (
                record.from_page_id.clone(),
                record.to_page_id.clone(),
                record.link_type,
            );
            if seen.insert(key) {
                links.push(record);
            } else {
                log::debug!(
                    "[assemble] duplicate {} link {} -> {} dropped",
                    record.link_type,
                    record.from_page_id,
                    record.to_page_id
                );
                final_duplicates += 1;
            }
        }

        Assembled {
            links,
            final_duplicates,
        }
    }

    fn hierarchy_record(&self, candidate: ResolvedCandidate) -> LinkRecord {
        self.record(
            candidate,
            HIERARCHY_PRIORITY,
            None,
            "Hierarchy link".to_string(),
        )
    }

    fn reclassified_record(&self, scored: ScoredCandidate) -> LinkRecord {
        let context = format!(
            "Hierarchy link, reclassified bridge (confidence: {:.3})",
            scored.confidence
        );
        self.record(
            scored.candidate,
            HIERARCHY_PRIORITY,
            Some(scored.confidence),
            context,
        )
    }

    fn selected_record(&self, scored: ScoredCandidate) -> LinkRecord {
        let label = match scored.link_type() {
            LinkType::Hierarchy => "Hierarchy",
            LinkType::Bridge => "Bridge",
            LinkType::Funnel => "Funnel",
        };
        let context = format!("{label} link (confidence: {:.3})", scored.confidence);
        self.record(
            scored.candidate,
            scored.priority,
            Some(scored.confidence),
            context,
        )
    }

    fn record(
        &self,
        candidate: ResolvedCandidate,
        priority: i32,
        confidence: Option<f64>,
        link_context: String,
    ) -> LinkRecord {
        let link_type = candidate.link_type();
        let funnel_stage = match link_type {
            LinkType::Funnel => Some(
                candidate
                    .body
                    .kind
                    .funnel_stage()
                    .unwrap_or_else(|| self.infer_stage(&candidate)),
            ),
            _ => None,
        };
        LinkRecord {
            architecture_id: self.architecture_id.to_string(),
            from_page_id: candidate.from_page_id,
            to_page_id: candidate.to_page_id,
            link_type,
            anchor_text: candidate.body.anchor_text,
            placement: candidate.body.placement,
            priority,
            confidence,
            source: candidate.body.source,
            resolution_method: candidate.resolution_method,
            funnel_stage,
            link_context,
        }
    }

    fn infer_stage(&self, candidate: &ResolvedCandidate) -> FunnelStage {
        let intent = |id: &str| self.catalog.get(id).and_then(|page| page.intent);
        FunnelStage::infer(
            intent(&candidate.from_page_id),
            intent(&candidate.to_page_id),
        )
    }
}

/// Counts per type and confidence aggregates over records that carry a confidence.
/// Pipeline counters are left at their defaults.
pub fn summarize(links: &[LinkRecord]) -> LinkStats {
    let mut by_type = TypeCounts::default();
    for link in links {
        by_type.add(link.link_type, 1);
    }

    let confidences: Vec<f64> = links.iter().filter_map(|link| link.confidence).collect();
    let (mean, min, max) = if confidences.is_empty() {
        (None, None, None)
    } else {
        let sum: f64 = confidences.iter().sum();
        (
            Some(sum / confidences.len() as f64),
            confidences.iter().copied().reduce(f64::min),
            confidences.iter().copied().reduce(f64::max),
        )
    };

    LinkStats {
        total: links.len(),
        by_type,
        mean_confidence: mean,
        min_confidence: min,
        max_confidence: max,
        ..LinkStats::default()
    }
}

/// Lowercase hex SHA-256 over the JSON encoding of `links`.
pub fn digest(links: &[LinkRecord]) -> Result<String> {
    let bytes = serde_json::to_vec(links)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let mut out = String::with_capacity(64);
    for byte in hasher.finalize().iter() {
        let _ = write!(out, "{byte:02x}");
    }
    Ok(out)
}
