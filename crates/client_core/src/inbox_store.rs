use std::sync::Arc;

use shared::{
    domain::{InboxItem, TypeFilter},
    protocol::{ScanSummary, UploadSummary},
};
use tracing::info;

use crate::{AudioUpload, ClientError, IntakeApi, Result};

/// Inbox filter criteria; an item passes iff it passes every active one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InboxFilter {
    pub only_review: bool,
    pub item_type: TypeFilter,
    /// Exact match on `tag.index`; `None` or `Some(0)` disables it.
    pub index: Option<u32>,
}

impl InboxFilter {
    pub fn matches(&self, item: &InboxItem) -> bool {
        if self.only_review && !item.needs_review {
            return false;
        }
        if !self.item_type.matches(item.tag.item_type) {
            return false;
        }
        match self.index {
            Some(index) if index != 0 => item.tag.index == index,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InboxStats {
    pub total: usize,
    pub review: usize,
    pub archived: usize,
}

pub struct InboxStore {
    api: Arc<dyn IntakeApi>,
    items: Vec<InboxItem>,
    loaded: bool,
}

impl InboxStore {
    pub fn new(api: Arc<dyn IntakeApi>) -> Self {
        Self {
            api,
            items: Vec::new(),
            loaded: false,
        }
    }

    /// Replaces the cached set with a fresh fetch. On error the previous set
    /// is kept as-is.
    pub async fn refresh(&mut self) -> Result<usize> {
        let items = self.api.list_inbox_items().await?;
        self.items = items;
        self.loaded = true;
        info!(items = self.items.len(), "inbox refreshed");
        Ok(self.items.len())
    }

    pub fn items(&self) -> &[InboxItem] {
        &self.items
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn find(&self, id: &str) -> Option<&InboxItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn filtered_view(&self, filter: &InboxFilter) -> Vec<&InboxItem> {
        self.items
            .iter()
            .filter(|item| filter.matches(item))
            .collect()
    }

    pub fn stats(&self) -> InboxStats {
        InboxStats {
            total: self.items.len(),
            review: self.items.iter().filter(|item| item.needs_review).count(),
            archived: self.items.iter().filter(|item| item.is_archived()).count(),
        }
    }

    pub async fn upload(&mut self, files: Vec<AudioUpload>) -> Result<UploadSummary> {
        if files.is_empty() {
            return Err(ClientError::validation("select at least one audio file to upload"));
        }
        let count = files.len();
        let summary = self.api.upload_audio(files).await?;
        info!(files = count, saved = summary.saved.len(), "uploaded audio to inbox");
        self.refresh().await?;
        Ok(summary)
    }

    pub async fn scan(&mut self) -> Result<ScanSummary> {
        let summary = self.api.scan_inbox().await?;
        info!(
            queued = summary.queued,
            processed = summary.processed,
            failed = summary.failed,
            "inbox scan finished"
        );
        self.refresh().await?;
        Ok(summary)
    }
}

#[cfg(test)]
#[path = "tests/inbox_store_tests.rs"]
mod tests;
