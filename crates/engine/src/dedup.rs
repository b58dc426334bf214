//! Pure `pool -> pool'` deduplication passes. Every function consumes its input
//! pools and returns new ones.

use std::collections::{HashMap, HashSet};

use sitelink_protocol::page_paths::same_routing_bucket;
use sitelink_resolver::PageCatalog;

use crate::candidate::ScoredCandidate;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DedupOutcome {
    pub bridges: Vec<ScoredCandidate>,
    pub funnels: Vec<ScoredCandidate>,
    /// Bridges inside one routing bucket, now hierarchy links.
    pub reclassified: Vec<ScoredCandidate>,
    pub duplicate_within_type: usize,
    pub funnel_precedence: usize,
}

/// Within-type pass, then funnel precedence, then same-bucket reclassification.
pub fn deduplicate(
    bridges: Vec<ScoredCandidate>,
    funnels: Vec<ScoredCandidate>,
    catalog: &PageCatalog,
) -> DedupOutcome {
    let (bridges, bridge_dups) = dedup_within_type(bridges);
    let (funnels, funnel_dups) = dedup_within_type(funnels);
    let (bridges, funnel_precedence) = apply_funnel_precedence(bridges, &funnels);
    let (bridges, reclassified) = reclassify_same_bucket(bridges, catalog);

    log::debug!(
        "[dedup] {} bridges, {} funnels kept; {} within-type duplicates, {} funnel precedence, {} reclassified",
        bridges.len(),
        funnels.len(),
        bridge_dups + funnel_dups,
        funnel_precedence,
        reclassified.len()
    );

    DedupOutcome {
        bridges,
        funnels,
        reclassified,
        duplicate_within_type: bridge_dups + funnel_dups,
        funnel_precedence,
    }
}

/// Keep the best entry per `(from, to)` pair. The survivor takes the slot of the
/// pair's first appearance; a full tie keeps the earlier entry.
pub fn dedup_within_type(pool: Vec<ScoredCandidate>) -> (Vec<ScoredCandidate>, usize) {
    let mut kept: Vec<ScoredCandidate> = Vec::with_capacity(pool.len());
    let mut slots: HashMap<(String, String), usize> = HashMap::with_capacity(pool.len());
    let mut dropped = 0;

    for candidate in pool {
        let key = (
            candidate.candidate.from_page_id.clone(),
            candidate.candidate.to_page_id.clone(),
        );
        match slots.get(&key) {
            Some(&slot) => {
                dropped += 1;
                if candidate.dedup_cmp(&kept[slot]).is_lt() {
                    log::debug!(
                        "[dedup] {} {} -> {} replaced by higher confidence {:.3}",
                        candidate.link_type(),
                        key.0,
                        key.1,
                        candidate.confidence
                    );
                    kept[slot] = candidate;
                }
            }
            None => {
                slots.insert(key, kept.len());
                kept.push(candidate);
            }
        }
    }

    (kept, dropped)
}

/// Drop bridges whose pair is also a funnel.
pub fn apply_funnel_precedence(
    bridges: Vec<ScoredCandidate>,
    funnels: &[ScoredCandidate],
) -> (Vec<ScoredCandidate>, usize) {
    let funnel_pairs: HashSet<(&str, &str)> = funnels.iter().map(ScoredCandidate::pair).collect();
    let before = bridges.len();
    let kept: Vec<ScoredCandidate> = bridges
        .into_iter()
        .filter(|bridge| {
            let shadowed = funnel_pairs.contains(&bridge.pair());
            if shadowed {
                log::debug!(
                    "[dedup] bridge {} -> {} dropped, funnel takes precedence",
                    bridge.candidate.from_page_id,
                    bridge.candidate.to_page_id
                );
            }
            !shadowed
        })
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

/// Split off bridges whose endpoints live in the same routing bucket and turn them
/// into hierarchy links.
pub fn reclassify_same_bucket(
    bridges: Vec<ScoredCandidate>,
    catalog: &PageCatalog,
) -> (Vec<ScoredCandidate>, Vec<ScoredCandidate>) {
    let (same, kept): (Vec<_>, Vec<_>) = bridges.into_iter().partition(|bridge| {
        match (
            catalog.get(&bridge.candidate.from_page_id),
            catalog.get(&bridge.candidate.to_page_id),
        ) {
            (Some(from), Some(to)) => same_routing_bucket(&from.path, &to.path),
            _ => false,
        }
    });

    let reclassified = same
        .into_iter()
        .map(|bridge| {
            log::info!(
                "[dedup] bridge {} -> {} stays inside one routing bucket, reclassified as hierarchy",
                bridge.candidate.from_page_id,
                bridge.candidate.to_page_id
            );
            bridge.into_hierarchy()
        })
        .collect();

    (kept, reclassified)
}
