use std::sync::Arc;

use shared::{
    domain::{ItemType, LibraryRow, TypeFilter},
    protocol::TakeList,
};
use tracing::{debug, info};

use crate::{IntakeApi, Result};

/// Per-(type, index) archive summary. The backend has no type filter, so the
/// full summary is cached and filtered locally.
pub struct LibraryView {
    api: Arc<dyn IntakeApi>,
    rows: Vec<LibraryRow>,
    type_filter: TypeFilter,
    takes: Option<TakeList>,
}

impl LibraryView {
    pub fn new(api: Arc<dyn IntakeApi>) -> Self {
        Self {
            api,
            rows: Vec::new(),
            type_filter: TypeFilter::All,
            takes: None,
        }
    }

    pub async fn refresh(&mut self, type_filter: TypeFilter) -> Result<Vec<LibraryRow>> {
        let rows = self.api.get_library_summary().await?;
        self.rows = rows;
        self.type_filter = type_filter;
        info!(rows = self.rows.len(), filter = %type_filter, "library summary refreshed");
        Ok(self.rows().into_iter().cloned().collect())
    }

    pub fn type_filter(&self) -> TypeFilter {
        self.type_filter
    }

    /// Cached rows under the filter of the last refresh.
    pub fn rows(&self) -> Vec<&LibraryRow> {
        self.rows
            .iter()
            .filter(|row| self.type_filter.matches(row.item_type))
            .collect()
    }

    pub fn total_takes(&self) -> u32 {
        self.rows().iter().map(|row| row.take_count).sum()
    }

    /// Fetches takes for one (type, index) on demand. An empty list is a
    /// normal result.
    pub async fn load_takes(&mut self, item_type: ItemType, index: u32) -> Result<TakeList> {
        let takes = self.api.get_library_takes(item_type, index).await?;
        debug!(%item_type, index, takes = takes.takes.len(), "loaded library takes");
        self.takes = Some(takes.clone());
        Ok(takes)
    }

    pub fn selected_takes(&self) -> Option<&TakeList> {
        self.takes.as_ref()
    }
}

#[cfg(test)]
#[path = "tests/library_view_tests.rs"]
mod tests;
