//! In-memory [`IntakeApi`] for tests in this crate and its dependents.
//!
//! Every call is recorded by operation name. Operations named in
//! [`FakeIntakeApi::fail_on`] return a collaborator error instead.

use std::{collections::HashSet, sync::Mutex};

use async_trait::async_trait;
use serde_json::json;
use shared::{
    domain::{InboxItem, ItemType, LibraryRow, Tag, TagSignals, Take},
    error::ErrorCode,
    mapping::{MappingConfig, TypeMapping},
    protocol::{
        AsrTestOptions, AsrTestResult, DailyBuildRequest, DailyBuildResult, HealthReport,
        OkResponse, RelabelRequest, RelabelResponse, SavedFile, ScanSummary, StructuredFile,
        StructuredFileList, TakeList, TeacherNeeds, TextFile, UploadSummary,
    },
};

use crate::{AudioUpload, ClientError, IntakeApi, Result};

#[derive(Default)]
pub struct FakeIntakeApi {
    pub mappings: Mutex<MappingConfig>,
    pub inbox: Mutex<Vec<InboxItem>>,
    pub library: Mutex<Vec<LibraryRow>>,
    pub takes: Mutex<Vec<Take>>,
    pub needs: Mutex<TeacherNeeds>,
    pub daily: Mutex<DailyBuildResult>,
    pub daily_requests: Mutex<Vec<DailyBuildRequest>>,
    pub relabels: Mutex<Vec<RelabelRequest>>,
    pub uploads: Mutex<Vec<String>>,
    pub asr_requests: Mutex<Vec<(String, AsrTestOptions)>>,
    pub opened: Mutex<Vec<String>>,
    calls: Mutex<Vec<&'static str>>,
    failing: Mutex<HashSet<&'static str>>,
    error_body: Mutex<Option<(u16, String)>>,
}

impl FakeIntakeApi {
    pub fn fail_on(&self, op: &'static str) {
        self.failing.lock().expect("failing").insert(op);
    }

    pub fn recover(&self, op: &'static str) {
        self.failing.lock().expect("failing").remove(op);
    }

    /// Status and body returned by failing operations; defaults to a 500.
    pub fn fail_with(&self, status: u16, body: &str) {
        *self.error_body.lock().expect("error body") = Some((status, body.to_string()));
    }

    pub fn calls_to(&self, op: &str) -> usize {
        self.calls
            .lock()
            .expect("calls")
            .iter()
            .filter(|call| **call == op)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().expect("calls").len()
    }

    pub fn call_log(&self) -> Vec<&'static str> {
        self.calls.lock().expect("calls").clone()
    }

    fn record(&self, op: &'static str) -> Result<()> {
        self.calls.lock().expect("calls").push(op);
        if !self.failing.lock().expect("failing").contains(op) {
            return Ok(());
        }
        let (status, body) = self
            .error_body
            .lock()
            .expect("error body")
            .clone()
            .unwrap_or_else(|| (500, format!("{op} unavailable")));
        Err(ClientError::Collaborator {
            status,
            reason: match status {
                400 => "Bad Request",
                404 => "Not Found",
                422 => "Unprocessable Entity",
                _ => "Internal Server Error",
            }
            .to_string(),
            code: ErrorCode::from_status(status),
            body,
        })
    }
}

#[async_trait]
impl IntakeApi for FakeIntakeApi {
    async fn get_mappings(&self) -> Result<MappingConfig> {
        self.record("get_mappings")?;
        Ok(self.mappings.lock().expect("mappings").clone())
    }

    async fn apply_seed_mapping(&self, _seed_file: Option<&str>) -> Result<OkResponse> {
        self.record("apply_seed_mapping")?;
        Ok(OkResponse { ok: true })
    }

    async fn list_inbox_items(&self) -> Result<Vec<InboxItem>> {
        self.record("list_inbox_items")?;
        Ok(self.inbox.lock().expect("inbox").clone())
    }

    async fn upload_audio(&self, files: Vec<AudioUpload>) -> Result<UploadSummary> {
        self.record("upload_audio")?;
        let saved: Vec<SavedFile> = files
            .iter()
            .map(|file| SavedFile {
                name: file.filename.clone(),
                path: format!("HomeworkVault/Inbox/{}", file.filename),
            })
            .collect();
        self.uploads
            .lock()
            .expect("uploads")
            .extend(files.into_iter().map(|file| file.filename));
        Ok(UploadSummary { saved })
    }

    async fn scan_inbox(&self) -> Result<ScanSummary> {
        self.record("scan_inbox")?;
        Ok(ScanSummary {
            queued: 1,
            processed: 1,
            failed: 0,
        })
    }

    async fn relabel_item(&self, request: &RelabelRequest) -> Result<RelabelResponse> {
        self.record("relabel_item")?;
        self.relabels
            .lock()
            .expect("relabels")
            .push(request.clone());
        Ok(RelabelResponse {
            ok: true,
            library_path: Some(format!(
                "HomeworkVault/Library/{}/take_20240501_083000.m4a",
                request.item_type.format_code(request.index)
            )),
        })
    }

    async fn get_library_summary(&self) -> Result<Vec<LibraryRow>> {
        self.record("get_library_summary")?;
        Ok(self.library.lock().expect("library").clone())
    }

    async fn get_library_takes(&self, item_type: ItemType, index: u32) -> Result<TakeList> {
        self.record("get_library_takes")?;
        Ok(TakeList {
            item_type,
            index,
            takes: self.takes.lock().expect("takes").clone(),
        })
    }

    async fn fetch_file_bytes(&self, path: &str) -> Result<Vec<u8>> {
        self.record("fetch_file_bytes")?;
        Ok(path.as_bytes().to_vec())
    }

    async fn fetch_text(&self, path: &str) -> Result<TextFile> {
        self.record("fetch_text")?;
        Ok(TextFile {
            path: path.to_string(),
            text: format!("# report\n{path}"),
        })
    }

    async fn open_folder(&self, path: &str) -> Result<OkResponse> {
        self.record("open_folder")?;
        self.opened.lock().expect("opened").push(path.to_string());
        Ok(OkResponse { ok: true })
    }

    async fn parse_teacher_command(&self, _text: &str) -> Result<TeacherNeeds> {
        self.record("parse_teacher_command")?;
        Ok(self.needs.lock().expect("needs").clone())
    }

    async fn build_daily(&self, request: &DailyBuildRequest) -> Result<DailyBuildResult> {
        self.record("build_daily")?;
        self.daily_requests
            .lock()
            .expect("daily requests")
            .push(request.clone());
        Ok(self.daily.lock().expect("daily").clone())
    }

    async fn health(&self) -> Result<HealthReport> {
        self.record("health")?;
        Ok(serde_json::from_value(json!({
            "ok": true,
            "time": "2024-05-01T08:30:00",
            "asr_engine": "faster-whisper"
        }))
        .expect("health"))
    }

    async fn asr_test(&self, file: AudioUpload, options: AsrTestOptions) -> Result<AsrTestResult> {
        self.record("asr_test")?;
        self.asr_requests
            .lock()
            .expect("asr requests")
            .push((file.filename.clone(), options));
        Ok(AsrTestResult {
            engine: "faster-whisper".to_string(),
            scope: Some(options.scope.as_str().to_string()),
            asr_text: format!("transcript of {}", file.filename),
            ..AsrTestResult::default()
        })
    }

    async fn list_structured_files(&self) -> Result<StructuredFileList> {
        self.record("list_structured_files")?;
        Ok(StructuredFileList {
            files: vec![
                "mappings_seed_from_originalText.json".to_string(),
                "notes.txt".to_string(),
            ],
        })
    }

    async fn read_structured_file(&self, path: &str) -> Result<StructuredFile> {
        self.record("read_structured_file")?;
        let is_json = path.ends_with(".json");
        Ok(StructuredFile {
            path: path.to_string(),
            data: is_json.then(|| json!({ "VOCAB": { "max_index": 20 } })),
            text: (!is_json).then(|| "plain notes".to_string()),
        })
    }
}

pub fn sample_item(
    id: &str,
    item_type: ItemType,
    index: u32,
    needs_review: bool,
    library_path: Option<&str>,
) -> InboxItem {
    InboxItem {
        id: id.to_string(),
        created_at: None,
        updated_at: None,
        src_path: Some(format!("HomeworkVault/Inbox/{id}.m4a")),
        library_path: library_path.map(str::to_string),
        needs_review,
        duration_sec: Some(12.5),
        tag: Tag {
            item_type,
            index,
            title_zh: String::new(),
            title_en: String::new(),
            confidence: if needs_review { 0.3 } else { 0.95 },
            signals: TagSignals::default(),
        },
        asr: None,
    }
}

pub fn library_row(item_type: ItemType, index: u32, take_count: u32) -> LibraryRow {
    LibraryRow {
        item_type,
        index,
        title_zh: String::new(),
        title_en: String::new(),
        take_count,
        latest_time: None,
    }
}

/// Mapping with `max_index` entries per type, titled `词汇01` / `VOCAB01` and so on.
pub fn mapping_with(entries: &[(ItemType, u32)]) -> MappingConfig {
    let mut config = MappingConfig::default();
    for (item_type, max_index) in entries {
        let mut mapping = TypeMapping {
            max_index: Some(*max_index),
            ..TypeMapping::default()
        };
        for index in 1..=*max_index {
            mapping.items.insert(
                index.to_string(),
                serde_json::from_value(json!({
                    "title_zh": format!("{}{index:02}", item_type.label()),
                    "title_en": format!("{}{index:02}", item_type.as_str()),
                }))
                .expect("entry"),
            );
        }
        config.types.insert(*item_type, mapping);
    }
    config
}
