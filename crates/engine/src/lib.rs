//! # Sitelink Engine
//!
//! Turns three independent streams of link suggestions into one bounded,
//! deterministic set of links for a site architecture.
//!
//! ```text
//! SuggestionSource x3 ─┐
//! PageCatalogSource ───┴─> collect ──> resolve ──> gate ──> score
//!                                                             │
//!        LinkStore <── assemble <── top-k select <── dedup <──┘
//! ```
//!
//! Hierarchy links skip the gate and the selector and always reach the output.
//! Bridges and funnels compete for `top_k` slots after per-type quotas are met.

pub mod assemble;
pub mod candidate;
pub mod collector;
pub mod config;
pub mod dedup;
mod engine;
mod error;
pub mod gate;
pub mod scoring;
pub mod select;
pub mod storage;

pub use candidate::{
    CandidateBody, CandidateKind, QualitySignals, RawCandidate, ResolvedCandidate,
    ScoredCandidate,
};
pub use collector::{
    collect, Collected, LinkSources, PageCatalogSource, StaticPages, StaticSuggestions,
    SuggestionSource,
};
pub use config::{
    EngineConfig, QualityThresholds, Quotas, ScoringWeights, SelectionPolicy, SiteLayout,
};
pub use engine::LinkEngine;
pub use error::{CollectError, EngineError, Result};
pub use storage::{persist, LinkStore, MemoryLinkStore};
