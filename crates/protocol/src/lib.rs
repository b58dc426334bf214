use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod page_paths;

pub const LINK_SET_SCHEMA_VERSION: u32 = 1;

/// Priority carried by every hierarchy link.
pub const HIERARCHY_PRIORITY: i32 = 100;

#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    Hierarchy,
    Bridge,
    Funnel,
}

impl LinkType {
    pub const ALL: [LinkType; 3] = [LinkType::Hierarchy, LinkType::Bridge, LinkType::Funnel];

    pub const fn as_str(self) -> &'static str {
        match self {
            LinkType::Hierarchy => "hierarchy",
            LinkType::Bridge => "bridge",
            LinkType::Funnel => "funnel",
        }
    }

    /// Provenance tag of the upstream stream that produces this type.
    pub const fn source(self) -> LinkSource {
        match self {
            LinkType::Hierarchy => LinkSource::VerticalLinking,
            LinkType::Bridge => LinkSource::StrategicBridges,
            LinkType::Funnel => LinkSource::FunnelAudit,
        }
    }
}

impl fmt::Display for LinkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LinkSource {
    VerticalLinking,
    StrategicBridges,
    FunnelAudit,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PageIntent {
    Informational,
    Commercial,
    Transactional,
}

impl PageIntent {
    const fn rank(self) -> u8 {
        match self {
            PageIntent::Informational => 0,
            PageIntent::Commercial => 1,
            PageIntent::Transactional => 2,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FunnelStage {
    Awareness,
    Consideration,
    Decision,
}

impl FunnelStage {
    /// Journey stage implied by moving from a page with `from` intent to one with `to`
    /// intent. Unknown intents count as informational.
    pub fn infer(from: Option<PageIntent>, to: Option<PageIntent>) -> Self {
        let from = from.unwrap_or(PageIntent::Informational).rank();
        let to = to.unwrap_or(PageIntent::Informational);
        if to.rank() <= from {
            return FunnelStage::Awareness;
        }
        match to {
            PageIntent::Commercial => FunnelStage::Consideration,
            _ => FunnelStage::Decision,
        }
    }
}

/// One page of a generated site architecture.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct Page {
    pub id: String,
    #[serde(default, alias = "name")]
    pub display_name: String,
    /// Semantic cluster/category the page was generated for.
    #[serde(default, alias = "cluster_name")]
    pub grouping_label: String,
    #[serde(default, alias = "url_path")]
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<PageIntent>,
}

/// Symbolic reference to a page as emitted by a suggestion source.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct PageRef {
    #[serde(default, alias = "cluster", skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, alias = "url", skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl PageRef {
    pub fn new(label: Option<&str>, path: Option<&str>) -> Self {
        Self {
            label: label.map(str::to_string),
            path: path.map(str::to_string),
        }
    }

    pub fn label(label: &str) -> Self {
        Self::new(Some(label), None)
    }

    pub fn path(path: &str) -> Self {
        Self::new(None, Some(path))
    }

    pub fn label_str(&self) -> Option<&str> {
        self.label.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn path_str(&self) -> Option<&str> {
        self.path.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.label_str().is_none() && self.path_str().is_none()
    }
}

impl fmt::Display for PageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "label='{}' path='{}'",
            self.label.as_deref().unwrap_or_default(),
            self.path.as_deref().unwrap_or_default()
        )
    }
}

/// One raw suggestion from a hierarchy, bridge or funnel source.
///
/// Quality fields are ignored for hierarchy suggestions. `semantic_relevance` above 1
/// is read as a percentage.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
pub struct RawSuggestion {
    #[serde(alias = "from_ref")]
    pub from: PageRef,
    #[serde(alias = "to_ref")]
    pub to: PageRef,
    #[serde(default, alias = "suggested_anchor")]
    pub anchor_text: String,
    #[serde(default, alias = "similarity_score")]
    pub semantic_relevance: Option<f64>,
    #[serde(default, alias = "serp_similarity")]
    pub contextual_relevance: Option<f64>,
    #[serde(default)]
    pub intent_match: Option<bool>,
    #[serde(default, alias = "placement_hints")]
    pub placement: Vec<String>,
    #[serde(default)]
    pub journey_ok: Option<bool>,
    #[serde(default)]
    pub has_outlier: Option<bool>,
    #[serde(default)]
    pub priority: Option<i32>,
    #[serde(default)]
    pub funnel_stage: Option<FunnelStage>,
}

/// Which resolver rule mapped a reference onto a page, strongest first.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    PathExact,
    LabelExact,
    LabelFuzzy,
    PathLastSegment,
}

/// One persisted link.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct LinkRecord {
    pub architecture_id: String,
    pub from_page_id: String,
    pub to_page_id: String,
    pub link_type: LinkType,
    pub anchor_text: String,
    pub placement: Vec<String>,
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub source: LinkSource,
    pub resolution_method: ResolutionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub funnel_stage: Option<FunnelStage>,
    pub link_context: String,
}

impl LinkRecord {
    pub fn triple(&self) -> (&str, &str, LinkType) {
        (&self.from_page_id, &self.to_page_id, self.link_type)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, JsonSchema)]
pub struct TypeCounts {
    pub hierarchy: usize,
    pub bridge: usize,
    pub funnel: usize,
}

impl TypeCounts {
    pub fn get(&self, link_type: LinkType) -> usize {
        match link_type {
            LinkType::Hierarchy => self.hierarchy,
            LinkType::Bridge => self.bridge,
            LinkType::Funnel => self.funnel,
        }
    }

    pub fn add(&mut self, link_type: LinkType, n: usize) {
        match link_type {
            LinkType::Hierarchy => self.hierarchy += n,
            LinkType::Bridge => self.bridge += n,
            LinkType::Funnel => self.funnel += n,
        }
    }

    pub fn total(&self) -> usize {
        self.hierarchy + self.bridge + self.funnel
    }
}

/// Candidates removed at each pipeline stage.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq, JsonSchema)]
pub struct DropCounts {
    pub invalid: usize,
    pub unresolved: usize,
    pub gated: usize,
    pub below_confidence: usize,
    pub duplicate_within_type: usize,
    pub funnel_precedence: usize,
    pub not_selected: usize,
    pub final_duplicates: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
pub struct QuotaShortfall {
    pub link_type: LinkType,
    pub required: usize,
    pub available: usize,
}

/// Aggregates reported alongside the final link set.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, JsonSchema)]
pub struct LinkStats {
    pub total: usize,
    pub by_type: TypeCounts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_confidence: Option<f64>,
    pub effective_k: usize,
    /// Suggestions received per source, before any filtering.
    pub candidates: TypeCounts,
    pub dropped: DropCounts,
    pub reclassified_to_hierarchy: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable_sources: Vec<LinkType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quota_shortfalls: Vec<QuotaShortfall>,
}

/// Everything handed to the storage collaborator for one architecture.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, JsonSchema)]
pub struct LinkSet {
    pub schema_version: u32,
    pub architecture_id: String,
    pub links: Vec<LinkRecord>,
    pub stats: LinkStats,
    /// SHA-256 over the serialized links; equal inputs give equal digests.
    pub digest: String,
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}
