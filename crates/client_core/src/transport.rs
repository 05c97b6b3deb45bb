//! reqwest implementation of [`IntakeApi`] against the intake backend's JSON API.

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use shared::{
    domain::{InboxItem, ItemType, LibraryRow},
    error::ErrorCode,
    mapping::MappingConfig,
    protocol::{
        AsrTestOptions, AsrTestResult, DailyBuildRequest, DailyBuildResult, HealthReport,
        OkResponse, RelabelRequest, RelabelResponse, ScanSummary, StructuredFile,
        StructuredFileList, TakeList, TeacherNeeds, TeacherParseRequest, TextFile, UploadSummary,
    },
};
use tracing::debug;
use url::Url;

use crate::{AudioUpload, ClientError, IntakeApi, Result};

pub struct HttpIntakeClient {
    http: Client,
    base_url: Url,
}

impl HttpIntakeClient {
    pub fn new(server_url: &str) -> Result<Self> {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: &str) -> Result<Self> {
        let mut base_url = Url::parse(server_url.trim())?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn audio_part(file: AudioUpload) -> Result<Part> {
        Ok(Part::bytes(file.bytes)
            .file_name(file.filename)
            .mime_str(&file.mime_type)?)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!(%url, "GET");
        let response = self.http.get(url).query(query).send().await?;
        decode_response(response).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST json");
        let response = self.http.post(url).json(body).send().await?;
        decode_response(response).await
    }

    async fn post_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.endpoint(path)?;
        debug!(%url, "POST");
        let response = self.http.post(url).query(query).send().await?;
        decode_response(response).await
    }
}

async fn decode_response<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(collaborator_error(status, &text));
    }
    match serde_json::from_str::<T>(&text) {
        Ok(value) => Ok(value),
        Err(source) => Err(ClientError::Decode { body: text, source }),
    }
}

fn collaborator_error(status: StatusCode, text: &str) -> ClientError {
    let body = serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| text.to_string());
    ClientError::Collaborator {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or_default().to_string(),
        code: ErrorCode::from_status(status.as_u16()),
        body,
    }
}

#[async_trait]
impl IntakeApi for HttpIntakeClient {
    async fn get_mappings(&self) -> Result<MappingConfig> {
        self.get_json("api/config/mappings", &[]).await
    }

    async fn apply_seed_mapping(&self, seed_file: Option<&str>) -> Result<OkResponse> {
        let query: Vec<(&str, String)> = seed_file
            .map(|seed| vec![("seed_file", seed.to_string())])
            .unwrap_or_default();
        self.post_query("api/config/apply-seed", &query).await
    }

    async fn list_inbox_items(&self) -> Result<Vec<InboxItem>> {
        self.get_json("api/inbox/items", &[]).await
    }

    async fn upload_audio(&self, files: Vec<AudioUpload>) -> Result<UploadSummary> {
        let mut form = Form::new();
        for file in files {
            form = form.part("files", Self::audio_part(file)?);
        }
        let url = self.endpoint("api/inbox/upload")?;
        debug!(%url, "POST multipart");
        let response = self.http.post(url).multipart(form).send().await?;
        decode_response(response).await
    }

    async fn scan_inbox(&self) -> Result<ScanSummary> {
        self.post_query("api/inbox/scan", &[]).await
    }

    async fn relabel_item(&self, request: &RelabelRequest) -> Result<RelabelResponse> {
        self.post_json("api/audio/relabel", request).await
    }

    async fn get_library_summary(&self) -> Result<Vec<LibraryRow>> {
        self.get_json("api/library/summary", &[]).await
    }

    async fn get_library_takes(&self, item_type: ItemType, index: u32) -> Result<TakeList> {
        self.get_json(
            "api/library/takes",
            &[
                ("type", item_type.as_str().to_string()),
                ("index", index.to_string()),
            ],
        )
        .await
    }

    async fn fetch_file_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let url = self.endpoint("api/file")?;
        debug!(%url, path, "GET bytes");
        let response = self.http.get(url).query(&[("path", path)]).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await?;
            return Err(collaborator_error(status, &text));
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn fetch_text(&self, path: &str) -> Result<TextFile> {
        self.get_json("api/text", &[("path", path.to_string())])
            .await
    }

    async fn open_folder(&self, path: &str) -> Result<OkResponse> {
        self.post_query("api/open-folder", &[("path", path.to_string())])
            .await
    }

    async fn parse_teacher_command(&self, text: &str) -> Result<TeacherNeeds> {
        self.post_json(
            "api/teacher/parse",
            &TeacherParseRequest {
                text: text.to_string(),
            },
        )
        .await
    }

    async fn build_daily(&self, request: &DailyBuildRequest) -> Result<DailyBuildResult> {
        self.post_json("api/daily/build", request).await
    }

    async fn health(&self) -> Result<HealthReport> {
        self.get_json("api/health", &[]).await
    }

    async fn asr_test(&self, file: AudioUpload, options: AsrTestOptions) -> Result<AsrTestResult> {
        let form = Form::new().part("file", Self::audio_part(file)?);
        let url = self.endpoint("api/asr/test")?;
        debug!(
            %url,
            scope = %options.scope,
            tag_window_sec = options.tag_window_sec,
            "POST multipart"
        );
        let response = self
            .http
            .post(url)
            .query(&[
                ("scope", options.scope.as_str().to_string()),
                ("tag_window_sec", options.tag_window_sec.to_string()),
            ])
            .multipart(form)
            .send()
            .await?;
        decode_response(response).await
    }

    async fn list_structured_files(&self) -> Result<StructuredFileList> {
        self.get_json("api/structured/list", &[]).await
    }

    async fn read_structured_file(&self, path: &str) -> Result<StructuredFile> {
        self.get_json("api/structured/read", &[("path", path.to_string())])
            .await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
