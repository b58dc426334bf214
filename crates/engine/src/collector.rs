use std::sync::Arc;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use sitelink_protocol::{LinkType, Page, PageRef, RawSuggestion, TypeCounts};

use crate::candidate::{CandidateBody, CandidateKind, QualitySignals, RawCandidate};
use crate::error::{CollectError, EngineError, Result};

const DEFAULT_BRIDGE_CONTEXTUAL: f64 = 0.7;
const DEFAULT_FUNNEL_CONTEXTUAL: f64 = 0.8;
const DEFAULT_PLACEMENT: &str = "natural_flow";

/// One upstream stream of link suggestions.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn fetch(&self, architecture_id: &str) -> AnyResult<Vec<RawSuggestion>>;
}

/// Provider of the page snapshot for one architecture.
#[async_trait]
pub trait PageCatalogSource: Send + Sync {
    async fn fetch_pages(&self, architecture_id: &str) -> AnyResult<Vec<Page>>;
}

/// Suggestions held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticSuggestions(pub Vec<RawSuggestion>);

#[async_trait]
impl SuggestionSource for StaticSuggestions {
    async fn fetch(&self, _architecture_id: &str) -> AnyResult<Vec<RawSuggestion>> {
        Ok(self.0.clone())
    }
}

/// Pages held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticPages(pub Vec<Page>);

#[async_trait]
impl PageCatalogSource for StaticPages {
    async fn fetch_pages(&self, _architecture_id: &str) -> AnyResult<Vec<Page>> {
        Ok(self.0.clone())
    }
}

#[derive(Clone)]
pub struct LinkSources {
    pub pages: Arc<dyn PageCatalogSource>,
    pub hierarchy: Arc<dyn SuggestionSource>,
    pub bridges: Arc<dyn SuggestionSource>,
    pub funnels: Arc<dyn SuggestionSource>,
}

/// Everything one run starts from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collected {
    pub pages: Vec<Page>,
    pub candidates: Vec<RawCandidate>,
    /// Suggestions received per source, before validation.
    pub received: TypeCounts,
    pub invalid: usize,
    pub unavailable: Vec<LinkType>,
}

impl Collected {
    /// Normalize already fetched suggestions. `None` marks a source as unavailable.
    pub fn from_parts(
        pages: Vec<Page>,
        hierarchy: Option<Vec<RawSuggestion>>,
        bridges: Option<Vec<RawSuggestion>>,
        funnels: Option<Vec<RawSuggestion>>,
    ) -> Self {
        let mut collected = Collected {
            pages,
            ..Collected::default()
        };
        for (link_type, stream) in [
            (LinkType::Hierarchy, hierarchy),
            (LinkType::Bridge, bridges),
            (LinkType::Funnel, funnels),
        ] {
            match stream {
                Some(suggestions) => collected.push_stream(link_type, suggestions),
                None => collected.unavailable.push(link_type),
            }
        }
        collected
    }

    fn push_stream(&mut self, link_type: LinkType, suggestions: Vec<RawSuggestion>) {
        self.received.add(link_type, suggestions.len());
        for (idx, suggestion) in suggestions.into_iter().enumerate() {
            match normalize_suggestion(link_type, suggestion) {
                Ok(candidate) => self.candidates.push(candidate),
                Err(err) => {
                    log::warn!("[collect] {link_type} suggestion #{idx} rejected: {err}");
                    self.invalid += 1;
                }
            }
        }
    }
}

/// Fetch the catalog and the three suggestion streams concurrently.
///
/// A failing suggestion source contributes nothing and is reported as unavailable;
/// a failing catalog source aborts the run.
pub async fn collect(sources: &LinkSources, architecture_id: &str) -> Result<Collected> {
    let (pages, hierarchy, bridges, funnels) = tokio::join!(
        sources.pages.fetch_pages(architecture_id),
        sources.hierarchy.fetch(architecture_id),
        sources.bridges.fetch(architecture_id),
        sources.funnels.fetch(architecture_id),
    );

    let pages = pages.map_err(|err| EngineError::CatalogUnavailable {
        architecture_id: architecture_id.to_string(),
        message: format!("{err:#}"),
    })?;

    let collected = Collected::from_parts(
        pages,
        available(LinkType::Hierarchy, hierarchy),
        available(LinkType::Bridge, bridges),
        available(LinkType::Funnel, funnels),
    );

    log::info!(
        "[collect] {} pages, {} hierarchy / {} bridge / {} funnel suggestions, {} invalid",
        collected.pages.len(),
        collected.received.hierarchy,
        collected.received.bridge,
        collected.received.funnel,
        collected.invalid
    );

    Ok(collected)
}

fn available(
    link_type: LinkType,
    fetched: AnyResult<Vec<RawSuggestion>>,
) -> Option<Vec<RawSuggestion>> {
    match fetched {
        Ok(suggestions) => Some(suggestions),
        Err(err) => {
            log::warn!("[collect] {link_type} source unavailable, continuing without it: {err:#}");
            None
        }
    }
}

/// Validate one raw suggestion and fill source-specific defaults.
pub fn normalize_suggestion(
    link_type: LinkType,
    raw: RawSuggestion,
) -> std::result::Result<RawCandidate, CollectError> {
    if raw.from.is_empty() {
        return Err(CollectError::EmptyReference { side: "from" });
    }
    if raw.to.is_empty() {
        return Err(CollectError::EmptyReference { side: "to" });
    }

    let kind = match link_type {
        LinkType::Hierarchy => CandidateKind::Hierarchy,
        LinkType::Bridge => CandidateKind::Bridge(signals(link_type, &raw)?),
        LinkType::Funnel => CandidateKind::Funnel {
            signals: signals(link_type, &raw)?,
            stage: raw.funnel_stage,
        },
    };

    let mut placement = raw.placement;
    if placement.is_empty() && link_type != LinkType::Hierarchy {
        placement.push(DEFAULT_PLACEMENT.to_string());
    }

    Ok(RawCandidate {
        from_ref: trimmed(raw.from),
        to_ref: trimmed(raw.to),
        body: CandidateBody::new(kind, raw.anchor_text.trim().to_string(), placement),
    })
}

fn signals(
    link_type: LinkType,
    raw: &RawSuggestion,
) -> std::result::Result<QualitySignals, CollectError> {
    let semantic = match raw.semantic_relevance {
        Some(value) => {
            let value = finite("semantic_relevance", value)?;
            let value = if value > 1.0 { value / 100.0 } else { value };
            unit("semantic_relevance", value)?
        }
        None => 0.0,
    };

    let default_contextual = match link_type {
        LinkType::Funnel => DEFAULT_FUNNEL_CONTEXTUAL,
        _ => DEFAULT_BRIDGE_CONTEXTUAL,
    };
    let contextual = match raw.contextual_relevance {
        Some(value) => unit("contextual_relevance", finite("contextual_relevance", value)?)?,
        None => default_contextual,
    };

    Ok(QualitySignals {
        semantic_relevance: semantic,
        contextual_relevance: contextual,
        intent_match: raw.intent_match.unwrap_or(true),
        journey_bonus: raw
            .journey_ok
            .unwrap_or(matches!(link_type, LinkType::Funnel)),
        outlier_penalty: raw.has_outlier.unwrap_or(false),
        priority: raw.priority,
    })
}

fn finite(field: &'static str, value: f64) -> std::result::Result<f64, CollectError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CollectError::NonFinite { field })
    }
}

fn unit(field: &'static str, value: f64) -> std::result::Result<f64, CollectError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(CollectError::OutOfRange { field, value })
    }
}

fn trimmed(reference: PageRef) -> PageRef {
    PageRef::new(reference.label_str(), reference.path_str())
}
