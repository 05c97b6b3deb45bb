use std::{fmt, str::FromStr};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::timestamp::{self, empty_as_none};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemType {
    #[serde(rename = "VOCAB")]
    Vocab,
    #[serde(rename = "SENTENCE")]
    Sentence,
    #[serde(rename = "FASTSTORY")]
    FastStory,
}

impl ItemType {
    pub const ALL: [ItemType; 3] = [ItemType::Vocab, ItemType::Sentence, ItemType::FastStory];

    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Vocab => "VOCAB",
            ItemType::Sentence => "SENTENCE",
            ItemType::FastStory => "FASTSTORY",
        }
    }

    /// Library folder code prefix, e.g. `C07`.
    pub fn code(self) -> char {
        match self {
            ItemType::Vocab => 'C',
            ItemType::Sentence => 'S',
            ItemType::FastStory => 'P',
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ItemType::Vocab => "词汇",
            ItemType::Sentence => "句子",
            ItemType::FastStory => "快嘴",
        }
    }

    /// Highest index assumed when no mapping configuration is available.
    pub fn fallback_max_index(self) -> u32 {
        match self {
            ItemType::Vocab => 17,
            ItemType::Sentence => 15,
            _ => 6,
        }
    }

    pub fn format_code(self, index: u32) -> String {
        format!("{}{index:02}", self.code())
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported item type: {0}")]
pub struct ParseItemTypeError(pub String);

impl FromStr for ItemType {
    type Err = ParseItemTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        ItemType::ALL
            .into_iter()
            .find(|item_type| item_type.as_str() == upper)
            .ok_or_else(|| ParseItemTypeError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeFilter {
    #[default]
    All,
    Only(ItemType),
}

impl TypeFilter {
    pub fn matches(self, item_type: ItemType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Only(wanted) => wanted == item_type,
        }
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeFilter::All => f.pad("ALL"),
            TypeFilter::Only(item_type) => item_type.fmt(f),
        }
    }
}

impl FromStr for TypeFilter {
    type Err = ParseItemTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("ALL") {
            return Ok(TypeFilter::All);
        }
        trimmed.parse().map(TypeFilter::Only)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagSignals {
    #[serde(default)]
    pub hit_keywords: Vec<String>,
    #[serde(default)]
    pub raw_number_forms: Vec<String>,
    #[serde(default)]
    pub raw_title_forms: Vec<String>,
    #[serde(default)]
    pub manual_override: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub index: u32,
    #[serde(default)]
    pub title_zh: String,
    #[serde(default)]
    pub title_en: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub signals: TagSignals,
}

impl Tag {
    pub fn display_title(&self) -> String {
        format!("{} / {}", self.title_zh, self.title_en)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsrSummary {
    pub engine: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxItem {
    pub id: String,
    #[serde(default, with = "timestamp::lenient")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "timestamp::lenient")]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub src_path: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub library_path: Option<String>,
    #[serde(default)]
    pub needs_review: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<f64>,
    pub tag: Tag,
    #[serde(default)]
    pub asr: Option<AsrSummary>,
}

impl InboxItem {
    pub fn is_archived(&self) -> bool {
        self.library_path.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryRow {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub index: u32,
    #[serde(default)]
    pub title_zh: String,
    #[serde(default)]
    pub title_en: String,
    #[serde(default)]
    pub take_count: u32,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub latest_time: Option<String>,
}

impl LibraryRow {
    pub fn latest_taken_at(&self) -> Option<NaiveDateTime> {
        self.latest_time
            .as_deref()
            .and_then(|latest| {
                timestamp::parse_take_stamp(latest).or_else(|| timestamp::parse_timestamp(latest))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Take {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub path: String,
}
