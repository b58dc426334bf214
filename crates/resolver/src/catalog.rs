use crate::error::{ResolverError, Result};
use sitelink_protocol::page_paths::normalize_page_path;
use sitelink_protocol::Page;
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable snapshot of one architecture's pages.
///
/// Cloning is cheap; every clone shares the same pages and indices.
#[derive(Debug, Clone)]
pub struct PageCatalog {
    inner: Arc<CatalogInner>,
}

#[derive(Debug)]
struct CatalogInner {
    pages: Vec<Page>,
    by_id: HashMap<String, usize>,
    /// Normalized path -> first page carrying it.
    by_path: HashMap<String, usize>,
}

impl PageCatalog {
    pub fn new(pages: Vec<Page>) -> Result<Self> {
        let mut by_id = HashMap::with_capacity(pages.len());
        let mut by_path = HashMap::with_capacity(pages.len());

        for (idx, page) in pages.iter().enumerate() {
            if page.id.trim().is_empty() {
                return Err(ResolverError::MissingPageId(page.path.clone()));
            }
            if by_id.insert(page.id.clone(), idx).is_some() {
                return Err(ResolverError::DuplicatePageId(page.id.clone()));
            }
            let path = normalize_page_path(&page.path);
            if !path.is_empty() {
                by_path.entry(path).or_insert(idx);
            }
        }

        if pages.is_empty() {
            log::warn!("[catalog] empty page catalog, no reference can resolve");
        }

        Ok(Self {
            inner: Arc::new(CatalogInner {
                pages,
                by_id,
                by_path,
            }),
        })
    }

    pub fn pages(&self) -> &[Page] {
        &self.inner.pages
    }

    pub fn len(&self) -> usize {
        self.inner.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.pages.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Page> {
        self.inner
            .by_id
            .get(id)
            .and_then(|idx| self.inner.pages.get(*idx))
    }

    /// Page whose normalized path equals `normalized_path`.
    pub fn find_by_path(&self, normalized_path: &str) -> Option<&Page> {
        self.inner
            .by_path
            .get(normalized_path)
            .and_then(|idx| self.inner.pages.get(*idx))
    }
}
