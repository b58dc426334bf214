use sitelink_protocol::{DropCounts, LinkSet, LinkType, LINK_SET_SCHEMA_VERSION};
use sitelink_resolver::{PageCatalog, PageResolver};

use crate::assemble::{digest, summarize, LinkSetAssembler};
use crate::candidate::{RawCandidate, ResolvedCandidate, ScoredCandidate};
use crate::collector::{collect, Collected, LinkSources};
use crate::config::EngineConfig;
use crate::dedup::deduplicate;
use crate::error::Result;
use crate::gate::QualityGate;
use crate::scoring::ConfidenceScorer;
use crate::select::{Selection, TopKSelector};

/// Runs the selection pipeline for one architecture at a time.
#[derive(Debug, Clone)]
pub struct LinkEngine {
    config: EngineConfig,
}

impl LinkEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Collect from `sources`, then select.
    pub async fn run(&self, architecture_id: &str, sources: &LinkSources) -> Result<LinkSet> {
        let collected = collect(sources, architecture_id).await?;
        self.select_links(architecture_id, collected)
    }

    /// Synchronous pipeline over an already collected snapshot: resolve, gate,
    /// score, deduplicate, select, assemble.
    ///
    /// Only an invalid catalog fails the run; every other problem drops the
    /// affected candidate.
    pub fn select_links(&self, architecture_id: &str, collected: Collected) -> Result<LinkSet> {
        let Collected {
            pages,
            candidates,
            received,
            invalid,
            unavailable,
        } = collected;

        let catalog = PageCatalog::new(pages)?;
        let resolver = PageResolver::new(catalog.clone(), self.config.matching);
        let mut dropped = DropCounts {
            invalid,
            ..DropCounts::default()
        };

        let resolved = resolve_all(&resolver, candidates, &mut dropped);
        let (hierarchy, bridges, funnels) = self.score_all(resolved, &mut dropped);

        let dedup = deduplicate(bridges, funnels, &catalog);
        dropped.duplicate_within_type = dedup.duplicate_within_type;
        dropped.funnel_precedence = dedup.funnel_precedence;
        let reclassified_to_hierarchy = dedup.reclassified.len();

        let Selection {
            picked,
            effective_k,
            shortfalls,
            not_selected,
        } = TopKSelector::new(self.config.selection).select(dedup.bridges, dedup.funnels);
        dropped.not_selected = not_selected;

        let assembled = LinkSetAssembler::new(architecture_id, &catalog).assemble(
            hierarchy,
            dedup.reclassified,
            picked,
        );
        dropped.final_duplicates = assembled.final_duplicates;

        let mut stats = summarize(&assembled.links);
        stats.effective_k = effective_k;
        stats.candidates = received;
        stats.dropped = dropped;
        stats.reclassified_to_hierarchy = reclassified_to_hierarchy;
        stats.unavailable_sources = unavailable;
        stats.quota_shortfalls = shortfalls;

        let digest = digest(&assembled.links)?;
        log::info!(
            "[engine] architecture {architecture_id}: {} links ({} hierarchy, {} bridge, {} funnel)",
            stats.total,
            stats.by_type.hierarchy,
            stats.by_type.bridge,
            stats.by_type.funnel
        );

        Ok(LinkSet {
            schema_version: LINK_SET_SCHEMA_VERSION,
            architecture_id: architecture_id.to_string(),
            links: assembled.links,
            stats,
            digest,
        })
    }

    /// Split resolved candidates into hierarchy links and scored bridge and funnel
    /// pools. Hierarchy links bypass the gate.
    fn score_all(
        &self,
        resolved: Vec<ResolvedCandidate>,
        dropped: &mut DropCounts,
    ) -> (
        Vec<ResolvedCandidate>,
        Vec<ScoredCandidate>,
        Vec<ScoredCandidate>,
    ) {
        let gate = QualityGate::new(self.config.quality);
        let scorer =
            ConfidenceScorer::new(self.config.scoring, self.config.quality.confidence_min);

        let mut hierarchy = Vec::new();
        let mut bridges = Vec::new();
        let mut funnels = Vec::new();

        for candidate in resolved {
            let Some(signals) = candidate.body.kind.signals().copied() else {
                hierarchy.push(candidate);
                continue;
            };
            let label = format!(
                "{} {} -> {}",
                candidate.link_type(),
                candidate.from_page_id,
                candidate.to_page_id
            );

            if let Err(rejection) = gate.check(&signals) {
                log::info!("[gate] {label} rejected: {rejection}");
                dropped.gated += 1;
                continue;
            }

            match scorer.score(candidate) {
                Ok(scored) if scored.link_type() == LinkType::Funnel => funnels.push(scored),
                Ok(scored) => bridges.push(scored),
                Err(rejection) => {
                    log::info!("[score] {label} rejected: {rejection}");
                    dropped.below_confidence += 1;
                }
            }
        }

        (hierarchy, bridges, funnels)
    }
}

/// Resolve both endpoints of every candidate. Unresolvable candidates are dropped,
/// and so are bridges or funnels whose ends land on the same page.
fn resolve_all(
    resolver: &PageResolver,
    candidates: Vec<RawCandidate>,
    dropped: &mut DropCounts,
) -> Vec<ResolvedCandidate> {
    let mut resolved = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let link_type = candidate.link_type();
        let (from, to) = match (
            resolver.resolve(&candidate.from_ref),
            resolver.resolve(&candidate.to_ref),
        ) {
            (Ok(from), Ok(to)) => (from, to),
            (Err(err), _) | (_, Err(err)) => {
                log::warn!("[resolve] {link_type} candidate dropped: {err}");
                dropped.unresolved += 1;
                continue;
            }
        };

        if link_type != LinkType::Hierarchy && from.page_id == to.page_id {
            log::warn!(
                "[resolve] {link_type} candidate dropped: both ends resolve to page {}",
                from.page_id
            );
            dropped.invalid += 1;
            continue;
        }

        resolved.push(ResolvedCandidate {
            resolution_method: from.method.max(to.method),
            from_page_id: from.page_id,
            to_page_id: to.page_id,
            body: candidate.body,
        });
    }
    resolved
}
