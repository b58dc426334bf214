use thiserror::Error;

pub type Result<T> = std::result::Result<T, ResolverError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResolverError {
    #[error("Duplicate page id in catalog: {0}")]
    DuplicatePageId(String),

    #[error("Page without id in catalog (path '{0}')")]
    MissingPageId(String),

    #[error("Empty page reference")]
    EmptyReference,

    #[error("No page matches {reference}")]
    Unresolved {
        reference: String,
        /// Best fuzzy similarity seen below the acceptance threshold.
        best_similarity: Option<f64>,
    },
}
