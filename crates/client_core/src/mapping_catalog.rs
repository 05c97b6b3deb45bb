use std::{ops::RangeInclusive, sync::Arc};

use shared::{
    domain::ItemType,
    mapping::{MappingConfig, MappingEntry, Titles},
    protocol::OkResponse,
};
use tracing::{info, warn};

use crate::{IntakeApi, Result};

/// Memoized mapping configuration. Index ranges fall back to built-in
/// defaults whenever nothing is loaded, so callers never block on it.
pub struct MappingCatalog {
    api: Arc<dyn IntakeApi>,
    cache: Option<Arc<MappingConfig>>,
}

impl MappingCatalog {
    pub fn new(api: Arc<dyn IntakeApi>) -> Self {
        Self { api, cache: None }
    }

    /// Fetches the configuration once; later calls return the cached value.
    /// A failed fetch caches nothing, so the next call retries.
    pub async fn load(&mut self) -> Result<Arc<MappingConfig>> {
        if let Some(cached) = &self.cache {
            return Ok(Arc::clone(cached));
        }
        let config = Arc::new(self.api.get_mappings().await?);
        info!(types = config.types.len(), "loaded mapping configuration");
        self.cache = Some(Arc::clone(&config));
        Ok(config)
    }

    pub fn invalidate(&mut self) {
        if self.cache.take().is_some() {
            info!("mapping configuration invalidated");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.is_some()
    }

    pub fn config(&self) -> Option<&MappingConfig> {
        self.cache.as_deref()
    }

    pub fn index_range(&self, item_type: ItemType) -> RangeInclusive<u32> {
        let max = self
            .config()
            .and_then(|config| config.max_index(item_type))
            .unwrap_or_else(|| item_type.fallback_max_index());
        1..=max
    }

    pub fn title_for(&self, item_type: ItemType, index: u32) -> Titles {
        self.config()
            .map(|config| config.titles(item_type, index))
            .unwrap_or_default()
    }

    pub fn entry(&self, item_type: ItemType, index: u32) -> Option<&MappingEntry> {
        self.config()?.entry(item_type, index)
    }

    /// Applies the backend's seed mapping, then drops and reloads the cache.
    /// If the reload fails the catalog stays empty and fallbacks apply.
    pub async fn apply_seed(&mut self, seed_file: Option<&str>) -> Result<OkResponse> {
        let response = self.api.apply_seed_mapping(seed_file).await?;
        self.invalidate();
        if let Err(err) = self.load().await {
            warn!(error = %err, "mapping reload after seed apply failed");
            return Err(err);
        }
        Ok(response)
    }
}

#[cfg(test)]
#[path = "tests/mapping_catalog_tests.rs"]
mod tests;
