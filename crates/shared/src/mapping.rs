//! Mapping configuration: valid indices and canonical titles per item type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::ItemType;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Titles {
    pub zh: String,
    pub en: String,
}

impl Titles {
    pub fn is_empty(&self) -> bool {
        self.zh.is_empty() && self.en.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    #[serde(default)]
    pub title_zh: String,
    #[serde(default)]
    pub title_en: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub synonyms: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MappingEntry {
    pub fn titles(&self) -> Titles {
        Titles {
            zh: self.title_zh.clone(),
            en: self.title_en.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeMapping {
    #[serde(default)]
    pub max_index: Option<u32>,
    #[serde(default)]
    pub items: BTreeMap<String, MappingEntry>,
}

impl TypeMapping {
    /// Configured upper bound, ignoring a zero or missing value.
    pub fn effective_max_index(&self) -> Option<u32> {
        self.max_index.filter(|max| *max >= 1)
    }

    pub fn entry(&self, index: u32) -> Option<&MappingEntry> {
        self.items.get(&index.to_string())
    }
}

/// The whole mapping document. Top-level keys that are not item types
/// (e.g. `GLOBAL_SYNONYMS`) are kept in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct MappingConfig {
    pub types: BTreeMap<ItemType, TypeMapping>,
    pub extra: Map<String, Value>,
}

impl MappingConfig {
    pub fn get(&self, item_type: ItemType) -> Option<&TypeMapping> {
        self.types.get(&item_type)
    }

    pub fn max_index(&self, item_type: ItemType) -> Option<u32> {
        self.get(item_type)
            .and_then(TypeMapping::effective_max_index)
    }

    pub fn entry(&self, item_type: ItemType, index: u32) -> Option<&MappingEntry> {
        self.get(item_type).and_then(|mapping| mapping.entry(index))
    }

    pub fn titles(&self, item_type: ItemType, index: u32) -> Titles {
        self.entry(item_type, index)
            .map(MappingEntry::titles)
            .unwrap_or_default()
    }
}

impl TryFrom<Map<String, Value>> for MappingConfig {
    type Error = serde_json::Error;

    fn try_from(raw: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut config = MappingConfig::default();
        for (key, value) in raw {
            match key.parse::<ItemType>() {
                Ok(item_type) => {
                    let mapping: TypeMapping = serde_json::from_value(value)?;
                    config.types.insert(item_type, mapping);
                }
                Err(_) => {
                    config.extra.insert(key, value);
                }
            }
        }
        Ok(config)
    }
}

impl From<MappingConfig> for Map<String, Value> {
    fn from(config: MappingConfig) -> Self {
        let mut raw = config.extra;
        for (item_type, mapping) in config.types {
            let value = serde_json::to_value(mapping).unwrap_or(Value::Null);
            raw.insert(item_type.as_str().to_string(), value);
        }
        raw
    }
}
