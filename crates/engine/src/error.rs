use sitelink_resolver::ResolverError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Page catalog unavailable for architecture '{architecture_id}': {message}")]
    CatalogUnavailable {
        architecture_id: String,
        message: String,
    },

    #[error("Invalid page catalog: {0}")]
    InvalidCatalog(#[from] ResolverError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to store links for architecture '{architecture_id}': {message}")]
    Storage {
        architecture_id: String,
        message: String,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a raw suggestion was rejected at the collector boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollectError {
    #[error("suggestion has an empty {side} reference")]
    EmptyReference { side: &'static str },

    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },

    #[error("{field}={value} is outside [0, 1]")]
    OutOfRange { field: &'static str, value: f64 },
}
