use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{
    domain::{ItemType, Take},
    timestamp::empty_as_none,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelabelRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub index: u32,
    pub title_zh: String,
    pub title_en: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelabelResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub library_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedFile {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSummary {
    #[serde(default)]
    pub saved: Vec<SavedFile>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    #[serde(default)]
    pub queued: u32,
    #[serde(default)]
    pub processed: u32,
    #[serde(default)]
    pub failed: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkResponse {
    #[serde(default)]
    pub ok: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeList {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub index: u32,
    #[serde(default)]
    pub takes: Vec<Take>,
}

/// Requested indices per item type, as produced by the teacher-command parser.
pub type Needs = BTreeMap<ItemType, Vec<u32>>;

#[derive(Debug, Clone, Serialize)]
pub struct TeacherParseRequest {
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeacherNeeds {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub needs: Needs,
}

impl TeacherNeeds {
    pub fn total_requested(&self) -> usize {
        self.needs.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBuildRequest {
    pub date: String,
    pub teacher_cmd: String,
    pub needs: Needs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingTakes {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub index: u32,
    pub missing_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyBuildResult {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub report_path: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub daily_dir: Option<String>,
    #[serde(default)]
    pub copied: u32,
    #[serde(default)]
    pub missing: Vec<MissingTakes>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFile {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub asr_engine: Option<String>,
    #[serde(default)]
    pub asr_process_scope: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// Tag window used by the ASR test when none is given.
pub const DEFAULT_TAG_WINDOW_SEC: u32 = 20;

/// Which part of a clip the ASR test transcribes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AsrScope {
    #[default]
    Full,
    Head,
    Hybrid,
}

impl AsrScope {
    pub const ALL: [AsrScope; 3] = [AsrScope::Full, AsrScope::Head, AsrScope::Hybrid];

    pub fn as_str(self) -> &'static str {
        match self {
            AsrScope::Full => "full",
            AsrScope::Head => "head",
            AsrScope::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for AsrScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported asr scope: {0}")]
pub struct ParseAsrScopeError(pub String);

impl FromStr for AsrScope {
    type Err = ParseAsrScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        AsrScope::ALL
            .into_iter()
            .find(|scope| scope.as_str() == lower)
            .ok_or_else(|| ParseAsrScopeError(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsrTestOptions {
    pub scope: AsrScope,
    pub tag_window_sec: u32,
}

impl Default for AsrTestOptions {
    fn default() -> Self {
        Self {
            scope: AsrScope::Full,
            tag_window_sec: DEFAULT_TAG_WINDOW_SEC,
        }
    }
}

/// Transcript and tag preview for a clip that was not stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AsrTestResult {
    #[serde(default)]
    pub engine: String,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub duration_sec: Option<f64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub used_head_clip: bool,
    #[serde(default)]
    pub fallback_to_full: bool,
    #[serde(default)]
    pub timing_ms: serde_json::Map<String, Value>,
    #[serde(default)]
    pub asr_text: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub tag_window_text: Option<String>,
    #[serde(default)]
    pub segments: Vec<Value>,
    #[serde(default)]
    pub tag_preview: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredFileList {
    #[serde(default)]
    pub files: Vec<String>,
}

/// A structured source file: JSON files arrive decoded in `data`, anything
/// else as `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredFile {
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub text: Option<String>,
}

impl StructuredFile {
    pub fn render(&self) -> String {
        match (&self.data, &self.text) {
            (Some(data), _) => serde_json::to_string_pretty(data).unwrap_or_default(),
            (None, Some(text)) => text.clone(),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn asr_scope_parses_case_insensitively() {
        assert_eq!("HYBRID".parse::<AsrScope>(), Ok(AsrScope::Hybrid));
        assert_eq!(" head ".parse::<AsrScope>(), Ok(AsrScope::Head));
        assert!("tail".parse::<AsrScope>().is_err());
        assert_eq!(AsrScope::default().to_string(), "full");
    }

    #[test]
    fn asr_result_tolerates_missing_and_empty_fields() {
        let result: AsrTestResult = serde_json::from_value(json!({
            "engine": "faster-whisper",
            "asr_text": "C seven color",
            "tag_window_text": "",
            "timing_ms": { "asr": 812 },
            "tag_preview": { "type": "VOCAB", "index": 7 }
        }))
        .expect("decode");

        assert_eq!(result.engine, "faster-whisper");
        assert!(result.tag_window_text.is_none());
        assert!(result.lang.is_none());
        assert!(!result.used_head_clip);
        assert_eq!(result.timing_ms.get("asr"), Some(&json!(812)));
    }
}
