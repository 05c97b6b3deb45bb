//! Draft state for correcting one inbox item's tag.
//!
//! The session is a plain record: every transition takes the catalog it
//! resolves against and the stores it must refresh as explicit arguments.
//! Indices outside the configured range are rejected, never clamped.

use std::ops::RangeInclusive;

use shared::{
    domain::{InboxItem, ItemType},
    mapping::Titles,
    protocol::{RelabelRequest, RelabelResponse},
};
use tracing::info;

use crate::{ClientError, InboxStore, IntakeApi, LibraryView, MappingCatalog, Result};

const DEFAULT_TYPE: ItemType = ItemType::Vocab;
const DEFAULT_INDEX: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelabelSession {
    item_id: Option<String>,
    item_type: ItemType,
    index: u32,
    title_zh: String,
    title_en: String,
    index_range: RangeInclusive<u32>,
    src_path: Option<String>,
}

impl Default for RelabelSession {
    fn default() -> Self {
        Self {
            item_id: None,
            item_type: DEFAULT_TYPE,
            index: DEFAULT_INDEX,
            title_zh: String::new(),
            title_en: String::new(),
            index_range: 1..=DEFAULT_TYPE.fallback_max_index(),
            src_path: None,
        }
    }
}

impl RelabelSession {
    pub fn new(catalog: &MappingCatalog) -> Self {
        let mut session = Self::default();
        session.clear(catalog);
        session
    }

    pub fn item_id(&self) -> Option<&str> {
        self.item_id.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.item_id.is_some()
    }

    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn titles(&self) -> Titles {
        Titles {
            zh: self.title_zh.clone(),
            en: self.title_en.clone(),
        }
    }

    pub fn index_range(&self) -> RangeInclusive<u32> {
        self.index_range.clone()
    }

    /// Source clip of the selected item, for the playback reference.
    pub fn src_path(&self) -> Option<&str> {
        self.src_path.as_deref()
    }

    pub fn start(&mut self, item: &InboxItem, catalog: &MappingCatalog) {
        self.item_id = Some(item.id.clone());
        self.item_type = item.tag.item_type;
        self.index = item.tag.index;
        self.index_range = catalog.index_range(self.item_type);
        self.src_path = item.src_path.clone();
        self.apply_titles(catalog);
    }

    pub fn change_type(&mut self, item_type: ItemType, catalog: &MappingCatalog) {
        self.item_type = item_type;
        self.index = DEFAULT_INDEX;
        self.index_range = catalog.index_range(item_type);
        self.apply_titles(catalog);
    }

    pub fn change_index(&mut self, index: u32, catalog: &MappingCatalog) -> Result<()> {
        let range = catalog.index_range(self.item_type);
        if !range.contains(&index) {
            return Err(out_of_range(self.item_type, index, &range));
        }
        self.index = index;
        self.index_range = range;
        self.apply_titles(catalog);
        Ok(())
    }

    pub fn set_titles(&mut self, title_zh: impl Into<String>, title_en: impl Into<String>) {
        self.title_zh = title_zh.into();
        self.title_en = title_en.into();
    }

    pub fn clear(&mut self, catalog: &MappingCatalog) {
        *self = Self {
            index_range: catalog.index_range(DEFAULT_TYPE),
            ..Self::default()
        };
    }

    /// Re-reads the index range after the catalog changed underneath an open
    /// draft. The index and any edited titles are kept; `to_request` rejects
    /// an index the new range no longer covers.
    pub fn sync_range(&mut self, catalog: &MappingCatalog) {
        self.index_range = catalog.index_range(self.item_type);
    }

    /// Builds the relabel payload, rejecting drafts that cannot be submitted.
    /// The index is checked against the catalog's current range.
    pub fn to_request(&self, catalog: &MappingCatalog) -> Result<RelabelRequest> {
        let id = self
            .item_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ClientError::validation("select an inbox item to relabel first"))?;
        let range = catalog.index_range(self.item_type);
        if !range.contains(&self.index) {
            return Err(out_of_range(self.item_type, self.index, &range));
        }
        Ok(RelabelRequest {
            id: id.to_string(),
            item_type: self.item_type,
            index: self.index,
            title_zh: self.title_zh.trim().to_string(),
            title_en: self.title_en.trim().to_string(),
        })
    }

    /// Sends the draft. On success the session resets, then the inbox and the
    /// library are refreshed in that order. On failure nothing changes.
    pub async fn submit(
        &mut self,
        api: &dyn IntakeApi,
        catalog: &MappingCatalog,
        inbox: &mut InboxStore,
        library: &mut LibraryView,
    ) -> Result<RelabelResponse> {
        let request = self.to_request(catalog)?;
        let response = api.relabel_item(&request).await?;
        info!(
            id = %request.id,
            item_type = %request.item_type,
            index = request.index,
            library_path = response.library_path.as_deref().unwrap_or(""),
            "item relabeled"
        );
        self.clear(catalog);
        inbox.refresh().await?;
        let filter = library.type_filter();
        library.refresh(filter).await?;
        Ok(response)
    }

    fn apply_titles(&mut self, catalog: &MappingCatalog) {
        let titles = catalog.title_for(self.item_type, self.index);
        self.title_zh = titles.zh;
        self.title_en = titles.en;
    }
}

fn out_of_range(item_type: ItemType, index: u32, range: &RangeInclusive<u32>) -> ClientError {
    ClientError::validation(format!(
        "index {index} is outside {}..={} for {item_type}",
        range.start(),
        range.end()
    ))
}

#[cfg(test)]
#[path = "tests/relabel_session_tests.rs"]
mod tests;
