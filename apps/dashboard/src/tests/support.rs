//! Fixtures for the dashboard tests. The collaborator fake itself lives in
//! `client_core::testing`.

use serde_json::json;
use shared::{
    domain::{InboxItem, ItemType, LibraryRow, Tag, TagSignals},
    mapping::{MappingConfig, TypeMapping},
};

pub(crate) use client_core::testing::FakeIntakeApi;

pub(crate) fn item(id: &str, item_type: ItemType, index: u32, needs_review: bool) -> InboxItem {
    InboxItem {
        id: id.to_string(),
        created_at: None,
        updated_at: None,
        src_path: Some(format!("HomeworkVault/Inbox/{id}.m4a")),
        library_path: None,
        needs_review,
        duration_sec: None,
        tag: Tag {
            item_type,
            index,
            title_zh: String::new(),
            title_en: String::new(),
            confidence: 0.5,
            signals: TagSignals::default(),
        },
        asr: None,
    }
}

pub(crate) fn row(item_type: ItemType, index: u32, take_count: u32) -> LibraryRow {
    LibraryRow {
        item_type,
        index,
        title_zh: format!("{}{index:02}", item_type.label()),
        title_en: format!("{}{index:02}", item_type.as_str()),
        take_count,
        latest_time: Some("take_20240501_083000.m4a".to_string()),
    }
}

pub(crate) fn mapping(max_vocab: u32) -> MappingConfig {
    let mut config = MappingConfig::default();
    let mut vocab = TypeMapping {
        max_index: Some(max_vocab),
        ..TypeMapping::default()
    };
    for index in 1..=max_vocab {
        vocab.items.insert(
            index.to_string(),
            serde_json::from_value(json!({
                "title_zh": format!("词{index}"),
                "title_en": format!("word {index}"),
                "synonyms": []
            }))
            .expect("entry"),
        );
    }
    config.types.insert(ItemType::Vocab, vocab);
    config
}
