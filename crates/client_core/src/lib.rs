use std::path::Path;

use async_trait::async_trait;
use shared::{
    domain::{InboxItem, ItemType, LibraryRow},
    mapping::MappingConfig,
    protocol::{
        AsrTestOptions, AsrTestResult, DailyBuildRequest, DailyBuildResult, HealthReport,
        OkResponse, RelabelRequest, RelabelResponse, ScanSummary, StructuredFile,
        StructuredFileList, TakeList, TeacherNeeds, TextFile, UploadSummary,
    },
};

pub mod error;
pub mod inbox_store;
pub mod library_view;
pub mod mapping_catalog;
pub mod relabel_session;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod transport;

pub use error::{ClientError, Result};
pub use inbox_store::{InboxFilter, InboxStats, InboxStore};
pub use library_view::LibraryView;
pub use mapping_catalog::MappingCatalog;
pub use relabel_session::RelabelSession;
pub use transport::HttpIntakeClient;

const DEFAULT_AUDIO_MIME: &str = "application/octet-stream";

/// One audio file queued for upload into the inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioUpload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AudioUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let mime_type = mime_guess::from_path(&filename)
            .first()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| DEFAULT_AUDIO_MIME.to_string());
        Self {
            filename,
            mime_type,
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ClientError::validation(format!("not a file path: {}", path.display()))
            })?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| ClientError::Io {
                path: path.display().to_string(),
                source,
            })?;
        Ok(Self::new(filename, bytes))
    }
}

/// Request/response contract of the intake backend. Every operation is a
/// single awaited round trip; implementations never retry.
#[async_trait]
pub trait IntakeApi: Send + Sync {
    async fn get_mappings(&self) -> Result<MappingConfig>;
    async fn apply_seed_mapping(&self, seed_file: Option<&str>) -> Result<OkResponse>;
    async fn list_inbox_items(&self) -> Result<Vec<InboxItem>>;
    async fn upload_audio(&self, files: Vec<AudioUpload>) -> Result<UploadSummary>;
    async fn scan_inbox(&self) -> Result<ScanSummary>;
    async fn relabel_item(&self, request: &RelabelRequest) -> Result<RelabelResponse>;
    async fn get_library_summary(&self) -> Result<Vec<LibraryRow>>;
    async fn get_library_takes(&self, item_type: ItemType, index: u32) -> Result<TakeList>;
    async fn fetch_file_bytes(&self, path: &str) -> Result<Vec<u8>>;
    async fn fetch_text(&self, path: &str) -> Result<TextFile>;
    async fn open_folder(&self, path: &str) -> Result<OkResponse>;
    async fn parse_teacher_command(&self, text: &str) -> Result<TeacherNeeds>;
    async fn build_daily(&self, request: &DailyBuildRequest) -> Result<DailyBuildResult>;
    async fn health(&self) -> Result<HealthReport>;
    /// Transcribes one clip without storing it.
    async fn asr_test(&self, file: AudioUpload, options: AsrTestOptions) -> Result<AsrTestResult>;
    async fn list_structured_files(&self) -> Result<StructuredFileList>;
    async fn read_structured_file(&self, path: &str) -> Result<StructuredFile>;
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
