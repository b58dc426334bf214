use std::collections::HashMap;

use anyhow::Result as AnyResult;
use async_trait::async_trait;
use sitelink_protocol::LinkSet;
use tokio::sync::RwLock;

use crate::error::{EngineError, Result};

/// Persistence collaborator. A write replaces every stored link of the architecture.
#[async_trait]
pub trait LinkStore: Send + Sync {
    async fn replace_links(&self, link_set: &LinkSet) -> AnyResult<()>;
}

/// Hand a computed link set to `store`. On failure the caller still owns `link_set`
/// and may retry without recomputing it.
pub async fn persist(store: &dyn LinkStore, link_set: &LinkSet) -> Result<()> {
    store
        .replace_links(link_set)
        .await
        .map_err(|err| EngineError::Storage {
            architecture_id: link_set.architecture_id.clone(),
            message: format!("{err:#}"),
        })?;
    log::info!(
        "[store] replaced links for architecture {} ({} records)",
        link_set.architecture_id,
        link_set.links.len()
    );
    Ok(())
}

#[derive(Debug, Default)]
pub struct MemoryLinkStore {
    sets: RwLock<HashMap<String, LinkSet>>,
}

impl MemoryLinkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, architecture_id: &str) -> Option<LinkSet> {
        self.sets.read().await.get(architecture_id).cloned()
    }
}

#[async_trait]
impl LinkStore for MemoryLinkStore {
    async fn replace_links(&self, link_set: &LinkSet) -> AnyResult<()> {
        self.sets
            .write()
            .await
            .insert(link_set.architecture_id.clone(), link_set.clone());
        Ok(())
    }
}
