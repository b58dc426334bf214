use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use sitelink_engine::{PageCatalogSource, SuggestionSource};
use sitelink_protocol::{Page, RawSuggestion};

/// Suggestions read from a JSON array on disk. Without a path the stream is empty.
pub struct JsonFileSuggestions {
    path: Option<PathBuf>,
}

impl JsonFileSuggestions {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl SuggestionSource for JsonFileSuggestions {
    async fn fetch(&self, _architecture_id: &str) -> Result<Vec<RawSuggestion>> {
        match &self.path {
            Some(path) => read_json_array(path).await,
            None => Ok(Vec::new()),
        }
    }
}

pub struct JsonFilePages {
    path: PathBuf,
}

impl JsonFilePages {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl PageCatalogSource for JsonFilePages {
    async fn fetch_pages(&self, _architecture_id: &str) -> Result<Vec<Page>> {
        read_json_array(&self.path).await
    }
}

pub(crate) async fn read_json_array<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is not a valid JSON array", path.display()))
}
