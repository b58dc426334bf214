use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sitelink_engine::LinkStore;
use sitelink_protocol::LinkSet;
use tokio::fs;

/// One JSON document per architecture under `dir`, replaced wholesale on every write.
#[derive(Clone, Debug)]
pub struct FileLinkStore {
    dir: PathBuf,
}

impl FileLinkStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path_for(&self, architecture_id: &str) -> Result<PathBuf> {
        let valid = !architecture_id.is_empty()
            && !architecture_id.starts_with('.')
            && architecture_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            bail!("Architecture id '{architecture_id}' cannot be used as a file name");
        }
        Ok(self.dir.join(format!("{architecture_id}.links.json")))
    }
}

#[async_trait]
impl LinkStore for FileLinkStore {
    async fn replace_links(&self, link_set: &LinkSet) -> Result<()> {
        let path = self.path_for(&link_set.architecture_id)?;
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Cannot create store dir {}", self.dir.display()))?;

        let bytes = serde_json::to_vec_pretty(link_set)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }
}
