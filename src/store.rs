//! Per-platform catalog indexes, loaded on first use.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};

use crate::catalog::CatalogIndex;
use crate::loader::{load_catalog_index, LoadError};

/// Maps platform labels to catalog files and caches one index per platform.
///
/// Each slot is filled at most once; an index is never rebuilt in place.
/// Failed loads leave the slot empty so a later call can retry.
#[derive(Debug)]
pub struct CatalogStore {
    datasets_dir: PathBuf,
    catalog_files: HashMap<String, PathBuf>,
    slots: HashMap<String, Slot>,
}

/// Readers go through `index` without locking once it is set; `loading`
/// is held only while the first successful load is in flight.
#[derive(Debug, Default)]
struct Slot {
    index: OnceLock<CatalogIndex>,
    loading: Mutex<()>,
}

impl CatalogStore {
    /// `platforms` are the labels that may be looked up. Labels in
    /// `catalog_files` are added automatically. Lookups ignore case and
    /// punctuation ("PlayStation 2" == "playstation2").
    pub fn new<'p>(
        datasets_dir: impl Into<PathBuf>,
        catalog_files: &BTreeMap<String, PathBuf>,
        platforms: impl IntoIterator<Item = &'p str>,
    ) -> Self {
        let catalog_files: HashMap<String, PathBuf> = catalog_files
            .iter()
            .map(|(platform, file)| (platform_slug(platform), file.clone()))
            .collect();

        let slots = platforms
            .into_iter()
            .map(platform_slug)
            .chain(catalog_files.keys().cloned())
            .filter(|slug| !slug.is_empty())
            .map(|slug| (slug, Slot::default()))
            .collect();

        Self {
            datasets_dir: datasets_dir.into(),
            catalog_files,
            slots,
        }
    }

    /// File holding the catalog of `platform`: the configured file, else
    /// `<slug>.json`, relative to the datasets directory.
    pub fn catalog_path(&self, platform: &str) -> PathBuf {
        let slug = platform_slug(platform);
        match self.catalog_files.get(&slug) {
            Some(file) => self.datasets_dir.join(file),
            None => self.datasets_dir.join(format!("{}.json", slug)),
        }
    }

    pub fn is_loaded(&self, platform: &str) -> bool {
        self.slots
            .get(&platform_slug(platform))
            .is_some_and(|slot| slot.index.get().is_some())
    }

    /// Shared index for `platform`, building it on the first call.
    pub fn index(&self, platform: &str) -> Result<&CatalogIndex, LoadError> {
        let slot = self
            .slots
            .get(&platform_slug(platform))
            .ok_or_else(|| LoadError::NoCatalog {
                platform: platform.to_string(),
            })?;

        if let Some(index) = slot.index.get() {
            return Ok(index);
        }

        // Concurrent first lookups wait here instead of loading their own copy.
        let _guard = slot.loading.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(index) = slot.index.get() {
            return Ok(index);
        }

        let path = self.catalog_path(platform);
        let index = load_catalog_index(&path)?;
        tracing::info!(platform, path = %path.display(), entries = index.len(), "loaded catalog");
        Ok(slot.index.get_or_init(|| index))
    }
}

/// Lowercase ASCII alphanumerics of a platform label.
pub fn platform_slug(platform: &str) -> String {
    platform
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
