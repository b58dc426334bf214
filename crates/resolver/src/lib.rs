//! # Sitelink Resolver
//!
//! Maps the symbolic page references emitted by suggestion sources (a cluster label,
//! a path, or both) onto concrete pages of one architecture's catalog.
//!
//! ```text
//! PageRef { label, path }
//!     │
//!     ├──> 1. exact path       (slashes normalized)
//!     ├──> 2. exact label      (case-insensitive, grouping label)
//!     ├──> 3. fuzzy label      (normalized, ratio >= 0.80)
//!     └──> 4. path last segment
//!            │
//!            └──> Resolution { page_id, method } | ResolverError::Unresolved
//! ```

mod catalog;
mod error;
mod normalize;
mod resolver;

pub use catalog::PageCatalog;
pub use error::{ResolverError, Result};
pub use normalize::{
    normalize_label, similarity, MatchThresholds, DEFAULT_FUZZY_ACCEPT,
    DEFAULT_STRICT_EQUIVALENCE, STOP_WORDS,
};
pub use resolver::{PageResolver, Resolution};
