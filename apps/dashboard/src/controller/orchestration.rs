//! Intent orchestration: each intent drives the client-core stores, then
//! records its outcome in a status area. Failures are caught here, written
//! verbatim to the area that owns the intent, and logged; caches are left as
//! they were.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::NaiveDate;
use client_core::{
    AudioUpload, InboxFilter, InboxStats, InboxStore, IntakeApi, LibraryView, MappingCatalog,
    RelabelSession,
};
use serde::Serialize;
use shared::{
    domain::{InboxItem, ItemType, LibraryRow, TypeFilter},
    protocol::{
        AsrTestOptions, AsrTestResult, DailyBuildRequest, DailyBuildResult, HealthReport,
        RelabelResponse, ScanSummary, StructuredFile, TakeList, TeacherNeeds, TextFile,
        UploadSummary,
    },
};
use tracing::{debug, info, warn};

use crate::controller::events::{StatusArea, Tab, UiError, UiErrorContext};

pub type IntentResult<T> = Result<T, UiError>;

const MAPPING_FALLBACK_NOTICE: &str = "failed to load mappings, using default index ranges.";

/// Outputs of the daily-bundle workflow, kept for the follow-up intents.
#[derive(Debug, Clone, Default)]
pub struct DailyState {
    pub needs: Option<TeacherNeeds>,
    pub build: Option<DailyBuildResult>,
    pub report: Option<TextFile>,
}

pub struct DashboardController {
    api: Arc<dyn IntakeApi>,
    catalog: MappingCatalog,
    inbox: InboxStore,
    library: LibraryView,
    relabel: RelabelSession,
    tab: Tab,
    inbox_filter: InboxFilter,
    library_filter: TypeFilter,
    status: BTreeMap<StatusArea, String>,
    daily: DailyState,
    health: Option<HealthReport>,
    source_files: Vec<String>,
}

impl DashboardController {
    pub fn new(api: Arc<dyn IntakeApi>, library_filter: TypeFilter) -> Self {
        let catalog = MappingCatalog::new(Arc::clone(&api));
        let relabel = RelabelSession::new(&catalog);
        Self {
            inbox: InboxStore::new(Arc::clone(&api)),
            library: LibraryView::new(Arc::clone(&api)),
            api,
            catalog,
            relabel,
            tab: Tab::default(),
            inbox_filter: InboxFilter::default(),
            library_filter,
            status: BTreeMap::new(),
            daily: DailyState::default(),
            health: None,
            source_files: Vec::new(),
        }
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn status(&self, area: StatusArea) -> Option<&str> {
        self.status.get(&area).map(String::as_str)
    }

    /// Status areas belonging to `tab`, in display order.
    pub fn statuses_for(&self, tab: Tab) -> Vec<(StatusArea, &str)> {
        self.status
            .iter()
            .filter(|(area, _)| area.tab() == tab)
            .map(|(area, text)| (*area, text.as_str()))
            .collect()
    }

    pub fn catalog(&self) -> &MappingCatalog {
        &self.catalog
    }

    pub fn inbox(&self) -> &InboxStore {
        &self.inbox
    }

    pub fn library(&self) -> &LibraryView {
        &self.library
    }

    pub fn relabel(&self) -> &RelabelSession {
        &self.relabel
    }

    pub fn inbox_filter(&self) -> InboxFilter {
        self.inbox_filter
    }

    pub fn library_filter(&self) -> TypeFilter {
        self.library_filter
    }

    pub fn daily(&self) -> &DailyState {
        &self.daily
    }

    pub fn health(&self) -> Option<&HealthReport> {
        self.health.as_ref()
    }

    pub fn source_files(&self) -> &[String] {
        &self.source_files
    }

    pub fn visible_inbox(&self) -> Vec<&InboxItem> {
        self.inbox.filtered_view(&self.inbox_filter)
    }

    pub fn inbox_stats(&self) -> InboxStats {
        self.inbox.stats()
    }

    pub fn library_rows(&self) -> Vec<&LibraryRow> {
        self.library.rows()
    }

    /// Loads mappings, resets the relabel form, then refreshes the inbox,
    /// the library and the source file list in that order. A mapping failure
    /// is reported and the fallback ranges stay in effect; the first refresh
    /// failure stops the sequence.
    pub async fn startup(&mut self) -> IntentResult<()> {
        info!(library_filter = %self.library_filter, "dashboard startup");
        let _ = self.load_mappings().await;
        self.relabel = RelabelSession::new(&self.catalog);

        let inbox = self.inbox.refresh().await;
        self.check(StatusArea::InboxLog, UiErrorContext::Startup, inbox)?;
        let filter = self.library_filter;
        let library = self.library.refresh(filter).await;
        self.check(StatusArea::InboxLog, UiErrorContext::Startup, library)?;
        let files = self.api.list_structured_files().await;
        let files = self.check(StatusArea::InboxLog, UiErrorContext::Startup, files)?;
        self.source_files = files.files;
        Ok(())
    }

    pub async fn load_mappings(&mut self) -> IntentResult<()> {
        match self.catalog.load().await {
            Ok(_) => Ok(()),
            Err(err) => {
                let ui_error = UiError::from_client(UiErrorContext::Mappings, &err);
                warn!(error = %err, "mapping load failed; fallback index ranges in use");
                self.set_status(
                    StatusArea::InboxLog,
                    format!("{MAPPING_FALLBACK_NOTICE}\n{}", ui_error.message()),
                );
                Err(ui_error)
            }
        }
    }

    pub fn select_tab(&mut self, tab: Tab) {
        debug!(from = %self.tab, to = %tab, "tab selected");
        self.tab = tab;
    }

    pub async fn upload(&mut self, files: Vec<AudioUpload>) -> IntentResult<UploadSummary> {
        let result = self.inbox.upload(files).await;
        let summary = self.check(StatusArea::InboxLog, UiErrorContext::Upload, result)?;
        self.set_status(StatusArea::InboxLog, pretty(&summary));
        Ok(summary)
    }

    /// Reads `paths` from disk and uploads them as one batch.
    pub async fn upload_paths(&mut self, paths: &[PathBuf]) -> IntentResult<UploadSummary> {
        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            let file = AudioUpload::from_path(path).await;
            let file = self.check(StatusArea::InboxLog, UiErrorContext::Upload, file)?;
            files.push(file);
        }
        self.upload(files).await
    }

    pub async fn scan(&mut self) -> IntentResult<ScanSummary> {
        let result = self.inbox.scan().await;
        let summary = self.check(StatusArea::InboxLog, UiErrorContext::Scan, result)?;
        self.set_status(StatusArea::InboxLog, pretty(&summary));
        Ok(summary)
    }

    pub async fn refresh_inbox(&mut self) -> IntentResult<usize> {
        let result = self.inbox.refresh().await;
        let count = self.check(StatusArea::InboxLog, UiErrorContext::Inbox, result)?;
        self.set_status(StatusArea::InboxLog, "inbox refreshed.");
        Ok(count)
    }

    /// Replaces the inbox criteria. Filtering runs over the cache, so this
    /// makes no collaborator call.
    pub fn set_inbox_filter(&mut self, filter: InboxFilter) -> Vec<&InboxItem> {
        debug!(?filter, "inbox filter changed");
        self.inbox_filter = filter;
        self.visible_inbox()
    }

    pub fn pick_for_relabel(&mut self, id: &str) -> IntentResult<()> {
        let Some(item) = self.inbox.find(id).cloned() else {
            return Err(self.fail(
                StatusArea::InboxLog,
                UiError::validation(
                    UiErrorContext::Relabel,
                    format!("inbox item {id} is not in the current list"),
                ),
            ));
        };
        self.relabel.start(&item, &self.catalog);
        info!(
            id,
            item_type = %item.tag.item_type,
            index = item.tag.index,
            "picked item for relabel"
        );
        self.set_status(
            StatusArea::InboxLog,
            format!("selected item for relabel: {id}"),
        );
        Ok(())
    }

    pub fn relabel_change_type(&mut self, item_type: ItemType) {
        self.relabel.change_type(item_type, &self.catalog);
    }

    pub fn relabel_change_index(&mut self, index: u32) -> IntentResult<()> {
        let result = self.relabel.change_index(index, &self.catalog);
        self.check(StatusArea::InboxLog, UiErrorContext::Relabel, result)
    }

    pub fn relabel_set_titles(&mut self, title_zh: &str, title_en: &str) {
        self.relabel.set_titles(title_zh, title_en);
    }

    pub fn relabel_clear(&mut self) {
        self.relabel.clear(&self.catalog);
        self.set_status(StatusArea::InboxLog, "relabel form cleared.");
    }

    pub async fn relabel_submit(&mut self) -> IntentResult<RelabelResponse> {
        let result = self
            .relabel
            .submit(
                &*self.api,
                &self.catalog,
                &mut self.inbox,
                &mut self.library,
            )
            .await;
        let response = self.check(StatusArea::InboxLog, UiErrorContext::Relabel, result)?;
        self.set_status(StatusArea::InboxLog, pretty(&response));
        Ok(response)
    }

    pub async fn refresh_library(&mut self) -> IntentResult<Vec<LibraryRow>> {
        let filter = self.library_filter;
        let result = self.library.refresh(filter).await;
        let rows = self.check(StatusArea::LibraryLog, UiErrorContext::Library, result)?;
        self.set_status(StatusArea::LibraryLog, "library summary refreshed.");
        Ok(rows)
    }

    pub async fn set_library_filter(
        &mut self,
        filter: TypeFilter,
    ) -> IntentResult<Vec<LibraryRow>> {
        self.library_filter = filter;
        self.refresh_library().await
    }

    pub async fn show_takes(&mut self, item_type: ItemType, index: u32) -> IntentResult<TakeList> {
        let result = self.library.load_takes(item_type, index).await;
        let takes = self.check(StatusArea::LibraryDetail, UiErrorContext::Takes, result)?;
        self.set_status(StatusArea::LibraryDetail, pretty(&takes));
        Ok(takes)
    }

    /// Raw bytes of an inbox clip or library take, for playback by the caller.
    pub async fn fetch_audio(&mut self, path: &str) -> IntentResult<Vec<u8>> {
        let result = self.api.fetch_file_bytes(path).await;
        let bytes = self.check(StatusArea::LibraryDetail, UiErrorContext::Audio, result)?;
        debug!(path, bytes = bytes.len(), "fetched audio");
        Ok(bytes)
    }

    pub async fn parse_teacher_command(&mut self, text: &str) -> IntentResult<TeacherNeeds> {
        let text = text.trim();
        if text.is_empty() {
            return Err(self.fail(
                StatusArea::DailyNeeds,
                UiError::validation(
                    UiErrorContext::TeacherParse,
                    "enter a teacher command first.",
                ),
            ));
        }
        let result = self.api.parse_teacher_command(text).await;
        let needs = self.check(StatusArea::DailyNeeds, UiErrorContext::TeacherParse, result)?;
        self.set_status(StatusArea::DailyNeeds, pretty(&needs));
        self.daily.needs = Some(needs.clone());
        Ok(needs)
    }

    /// Parses the command, builds the bundle for `date`, then loads the
    /// report when the build produced one. A report failure is shown in the
    /// report area without failing the build.
    pub async fn build_daily(
        &mut self,
        date: NaiveDate,
        teacher_cmd: &str,
    ) -> IntentResult<DailyBuildResult> {
        let teacher_cmd = teacher_cmd.trim();
        if teacher_cmd.is_empty() {
            return Err(self.fail(
                StatusArea::DailyResult,
                UiError::validation(UiErrorContext::DailyBuild, "enter a teacher command first."),
            ));
        }

        let parsed = self.api.parse_teacher_command(teacher_cmd).await;
        let parsed = self.check(StatusArea::DailyResult, UiErrorContext::DailyBuild, parsed)?;
        let request = DailyBuildRequest {
            date: date.format("%Y-%m-%d").to_string(),
            teacher_cmd: teacher_cmd.to_string(),
            needs: parsed.needs.clone(),
        };
        let built = self.api.build_daily(&request).await;
        let built = self.check(StatusArea::DailyResult, UiErrorContext::DailyBuild, built)?;
        info!(
            date = %request.date,
            requested = parsed.total_requested(),
            copied = built.copied,
            missing = built.missing.len(),
            "daily bundle built"
        );

        self.set_status(StatusArea::DailyNeeds, pretty(&parsed));
        self.set_status(StatusArea::DailyResult, pretty(&built));
        self.daily.needs = Some(parsed);
        self.daily.build = Some(built.clone());
        self.daily.report = None;

        if built.report_path.is_some() {
            let _ = self.load_report().await;
        }
        Ok(built)
    }

    pub async fn load_report(&mut self) -> IntentResult<TextFile> {
        let Some(report_path) = self
            .daily
            .build
            .as_ref()
            .and_then(|build| build.report_path.clone())
        else {
            return Err(self.fail(
                StatusArea::DailyReport,
                UiError::validation(UiErrorContext::Report, "run a daily build first."),
            ));
        };
        let result = self.api.fetch_text(&report_path).await;
        let report = self.check(StatusArea::DailyReport, UiErrorContext::Report, result)?;
        self.set_status(StatusArea::DailyReport, report.text.clone());
        self.daily.report = Some(report.clone());
        Ok(report)
    }

    pub async fn open_daily_folder(&mut self) -> IntentResult<()> {
        let Some(daily_dir) = self
            .daily
            .build
            .as_ref()
            .and_then(|build| build.daily_dir.clone())
        else {
            return Err(self.fail(
                StatusArea::DailyResult,
                UiError::validation(UiErrorContext::OpenFolder, "run a daily build first."),
            ));
        };
        let result = self.api.open_folder(&daily_dir).await;
        let opened = self.check(StatusArea::DailyResult, UiErrorContext::OpenFolder, result)?;
        let previous = self.status(StatusArea::DailyResult).unwrap_or_default();
        let text = format!("{previous}\n\n[open folder] {}", pretty(&opened));
        self.set_status(StatusArea::DailyResult, text);
        Ok(())
    }

    /// Applies a seed mapping on the backend and reloads the catalog. The
    /// relabel form picks up the new ranges on its next transition.
    pub async fn apply_seed(&mut self, seed_file: Option<&str>) -> IntentResult<()> {
        let result = self.catalog.apply_seed(seed_file).await;
        self.relabel.sync_range(&self.catalog);
        let response = self.check(StatusArea::SourceLog, UiErrorContext::Seed, result)?;
        self.set_status(
            StatusArea::SourceLog,
            format!("seed applied: {}", pretty(&response)),
        );
        Ok(())
    }

    pub async fn check_health(&mut self) -> IntentResult<HealthReport> {
        let result = self.api.health().await;
        let report = self.check(StatusArea::HealthResult, UiErrorContext::Health, result)?;
        self.set_status(StatusArea::HealthResult, pretty(&report));
        self.health = Some(report.clone());
        Ok(report)
    }

    /// Transcribes one clip with the given scope and tag window. Nothing is
    /// stored on the backend.
    pub async fn asr_test(
        &mut self,
        file: Option<AudioUpload>,
        options: AsrTestOptions,
    ) -> IntentResult<AsrTestResult> {
        let Some(file) = file else {
            return Err(self.fail(
                StatusArea::AsrResult,
                UiError::validation(UiErrorContext::AsrTest, "select an audio file first."),
            ));
        };
        if options.tag_window_sec == 0 {
            return Err(self.fail(
                StatusArea::AsrResult,
                UiError::validation(
                    UiErrorContext::AsrTest,
                    "tag window must be at least 1 second.",
                ),
            ));
        }
        info!(file = %file.filename, scope = %options.scope, "asr test");
        let result = self.api.asr_test(file, options).await;
        let result = self.check(StatusArea::AsrResult, UiErrorContext::AsrTest, result)?;
        self.set_status(StatusArea::AsrResult, pretty(&result));
        Ok(result)
    }

    pub async fn asr_test_path(
        &mut self,
        path: Option<&Path>,
        options: AsrTestOptions,
    ) -> IntentResult<AsrTestResult> {
        let file = match path {
            Some(path) => {
                let file = AudioUpload::from_path(path).await;
                let file = self.check(StatusArea::AsrResult, UiErrorContext::AsrTest, file)?;
                Some(file)
            }
            None => None,
        };
        self.asr_test(file, options).await
    }

    pub async fn refresh_source_files(&mut self) -> IntentResult<&[String]> {
        let result = self.api.list_structured_files().await;
        let listing = self.check(StatusArea::SourceLog, UiErrorContext::Source, result)?;
        self.source_files = listing.files;
        self.set_status(StatusArea::SourceLog, "source file list refreshed.");
        Ok(&self.source_files)
    }

    pub async fn read_source_file(&mut self, name: &str) -> IntentResult<StructuredFile> {
        let name = name.trim();
        if name.is_empty() {
            return Err(self.fail(
                StatusArea::SourceLog,
                UiError::validation(UiErrorContext::Source, "select a source file first."),
            ));
        }
        let result = self.api.read_structured_file(name).await;
        let file = self.check(StatusArea::SourceLog, UiErrorContext::Source, result)?;
        self.set_status(StatusArea::SourceContent, file.render());
        self.set_status(StatusArea::SourceLog, format!("read: {name}"));
        Ok(file)
    }

    fn set_status(&mut self, area: StatusArea, text: impl Into<String>) {
        self.status.insert(area, text.into());
    }

    fn fail(&mut self, area: StatusArea, err: UiError) -> UiError {
        warn!(
            tab = %area.tab(),
            context = ?err.context(),
            category = ?err.category(),
            error = %err.message(),
            "intent failed"
        );
        self.set_status(area, err.message());
        err
    }

    fn check<T>(
        &mut self,
        area: StatusArea,
        context: UiErrorContext,
        result: client_core::Result<T>,
    ) -> IntentResult<T> {
        result.map_err(|err| {
            if let Some(detail) = err.detail() {
                debug!(%detail, "collaborator detail");
            }
            self.fail(area, UiError::from_client(context, &err))
        })
    }
}

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}

#[cfg(test)]
#[path = "../tests/orchestration_tests.rs"]
mod tests;
