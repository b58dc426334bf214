use clap::ValueEnum;
use sitelink_engine::SiteLayout;

#[derive(Copy, Clone, ValueEnum)]
pub(crate) enum LayoutFlag {
    Clusters,
    Silo,
}

impl LayoutFlag {
    pub(crate) const fn as_domain(self) -> SiteLayout {
        match self {
            LayoutFlag::Clusters => SiteLayout::Clusters,
            LayoutFlag::Silo => SiteLayout::Silo,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
pub(crate) enum SchemaTarget {
    Page,
    Suggestion,
    LinkSet,
}
