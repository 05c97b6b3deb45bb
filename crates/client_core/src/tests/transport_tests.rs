use super::*;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode as HttpStatus,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shared::protocol::AsrScope;
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct BackendState {
    relabels: Arc<Mutex<Vec<Value>>>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
    uploads: Arc<Mutex<Vec<(String, String, usize)>>>,
}

async fn handle_inbox_items() -> Json<Value> {
    Json(json!([
        {
            "id": "a1",
            "created_at": "2024-05-01T08:30:00.123456",
            "src_path": "HomeworkVault/Inbox/a1.m4a",
            "library_path": "",
            "needs_review": true,
            "tag": {
                "type": "VOCAB",
                "index": 7,
                "title_zh": "颜色",
                "title_en": "Color",
                "confidence": 0.42,
                "signals": { "hit_keywords": ["color"], "number_source": "asr" }
            },
            "asr": { "engine": "faster-whisper", "text": "C seven color" }
        },
        {
            "id": "b2",
            "created_at": "not a timestamp",
            "library_path": "HomeworkVault/Library/S05/take_20240501_083000.m4a",
            "needs_review": false,
            "tag": { "type": "SENTENCE", "index": 5 }
        }
    ]))
}

async fn handle_missing_summary() -> impl IntoResponse {
    (
        HttpStatus::NOT_FOUND,
        Json(json!({ "detail": "library folder missing" })),
    )
}

async fn handle_broken_health() -> impl IntoResponse {
    (HttpStatus::OK, "<html>proxy error page</html>")
}

async fn handle_plain_error() -> impl IntoResponse {
    (HttpStatus::BAD_GATEWAY, "upstream timed out")
}

async fn handle_relabel(
    State(state): State<BackendState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    state.relabels.lock().expect("relabels").push(body);
    Json(json!({
        "ok": true,
        "library_path": "HomeworkVault/Library/S05/take_20240501_083000.m4a"
    }))
}

async fn handle_takes(
    State(state): State<BackendState>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.queries.lock().expect("queries").push(query.clone());
    let index = query
        .get("index")
        .and_then(|index| index.parse::<u32>().ok())
        .unwrap_or(0);
    Json(json!({
        "type": query.get("type").cloned().unwrap_or_default(),
        "index": index,
        "takes": [{
            "name": "take_20240501_083000.m4a",
            "path": "HomeworkVault/Library/C07/take_20240501_083000.m4a"
        }]
    }))
}

async fn handle_file(
    State(state): State<BackendState>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    state.queries.lock().expect("queries").push(query);
    (HttpStatus::OK, vec![0x49u8, 0x44, 0x33, 0x04])
}

async fn handle_apply_seed(
    State(state): State<BackendState>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.queries.lock().expect("queries").push(query);
    Json(json!({ "ok": true }))
}

async fn handle_upload(
    State(state): State<BackendState>,
    mut multipart: Multipart,
) -> Json<Value> {
    let mut saved = Vec::new();
    while let Some(field) = multipart.next_field().await.expect("field") {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.expect("bytes");
        state
            .uploads
            .lock()
            .expect("uploads")
            .push((name, file_name.clone(), bytes.len()));
        let path = format!("HomeworkVault/Inbox/{file_name}");
        saved.push(json!({ "name": file_name, "path": path }));
    }
    Json(json!({ "saved": saved }))
}

async fn handle_asr_test(
    State(state): State<BackendState>,
    Query(query): Query<HashMap<String, String>>,
    mut multipart: Multipart,
) -> Json<Value> {
    state.queries.lock().expect("queries").push(query.clone());
    while let Some(field) = multipart.next_field().await.expect("field") {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.expect("bytes");
        state
            .uploads
            .lock()
            .expect("uploads")
            .push((name, file_name, bytes.len()));
    }
    Json(json!({
        "engine": "faster-whisper",
        "lang": "zh",
        "duration_sec": 4.2,
        "scope": query.get("scope").cloned().unwrap_or_default(),
        "used_head_clip": true,
        "fallback_to_full": false,
        "timing_ms": { "asr": 812 },
        "asr_text": "C seven color",
        "tag_window_text": "C seven",
        "segments": [{ "start": 0.0, "end": 1.4, "text": "C seven" }],
        "tag_preview": { "type": "VOCAB", "index": 7 }
    }))
}

fn backend_routes() -> Router<BackendState> {
    Router::new()
        .route("/api/inbox/items", get(handle_inbox_items))
        .route("/api/library/summary", get(handle_missing_summary))
        .route("/api/health", get(handle_broken_health))
        .route("/api/structured/list", get(handle_plain_error))
        .route("/api/audio/relabel", post(handle_relabel))
        .route("/api/library/takes", get(handle_takes))
        .route("/api/file", get(handle_file))
        .route("/api/config/apply-seed", post(handle_apply_seed))
        .route("/api/inbox/upload", post(handle_upload))
        .route("/api/asr/test", post(handle_asr_test))
}

async fn spawn_backend() -> Result<(String, BackendState), Box<dyn std::error::Error>> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = BackendState::default();
    let app = Router::new()
        .merge(backend_routes())
        .nest("/intake", backend_routes())
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

#[test]
fn base_url_gains_trailing_slash() {
    let client = HttpIntakeClient::new("http://127.0.0.1:8000/intake").expect("client");
    assert_eq!(client.base_url().as_str(), "http://127.0.0.1:8000/intake/");

    let err = HttpIntakeClient::new("not a url")
        .err()
        .expect("invalid url rejected");
    assert!(matches!(err, ClientError::InvalidUrl(_)));
}

#[tokio::test]
async fn inbox_items_decode_backend_quirks() {
    let (server_url, _state) = spawn_backend().await.expect("backend");
    let client = HttpIntakeClient::new(&server_url).expect("client");

    let items = client.list_inbox_items().await.expect("items");

    assert_eq!(items.len(), 2);
    let first = &items[0];
    assert_eq!(first.tag.item_type, ItemType::Vocab);
    assert_eq!(first.tag.index, 7);
    assert!(first.library_path.is_none());
    assert!(!first.is_archived());
    assert_eq!(
        first
            .created_at
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string()),
        Some("2024-05-01 08:30:00".to_string())
    );
    assert!(first.tag.signals.extra.contains_key("number_source"));
    assert_eq!(
        first.asr.as_ref().map(|asr| asr.engine.as_str()),
        Some("faster-whisper")
    );

    let second = &items[1];
    assert!(second.created_at.is_none());
    assert!(second.is_archived());
    assert_eq!(second.tag.title_zh, "");
}

#[tokio::test]
async fn path_prefix_in_server_url_is_preserved() {
    let (server_url, _state) = spawn_backend().await.expect("backend");
    let client = HttpIntakeClient::new(&format!("{server_url}/intake")).expect("client");

    let items = client.list_inbox_items().await.expect("items under prefix");
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn error_status_surfaces_status_and_pretty_body() {
    let (server_url, _state) = spawn_backend().await.expect("backend");
    let client = HttpIntakeClient::new(&server_url).expect("client");

    let err = client.get_library_summary().await.expect_err("404");

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.code(), Some(ErrorCode::NotFound));
    assert_eq!(err.detail().as_deref(), Some("library folder missing"));
    assert_eq!(
        err.to_string(),
        "404 Not Found\n{\n  \"detail\": \"library folder missing\"\n}"
    );
}

#[tokio::test]
async fn non_json_error_body_is_kept_verbatim() {
    let (server_url, _state) = spawn_backend().await.expect("backend");
    let client = HttpIntakeClient::new(&server_url).expect("client");

    let err = client.list_structured_files().await.expect_err("502");

    assert_eq!(err.to_string(), "502 Bad Gateway\nupstream timed out");
    assert!(err.detail().is_none());
}

#[tokio::test]
async fn unparseable_success_body_is_reported_as_raw_text() {
    let (server_url, _state) = spawn_backend().await.expect("backend");
    let client = HttpIntakeClient::new(&server_url).expect("client");

    let err = client
        .health()
        .await
        .expect_err("html is not a health report");

    assert!(matches!(err, ClientError::Decode { .. }));
    assert_eq!(err.to_string(), "<html>proxy error page</html>");
    assert_eq!(err.status(), None);
}

#[tokio::test]
async fn relabel_posts_type_field() {
    let (server_url, state) = spawn_backend().await.expect("backend");
    let client = HttpIntakeClient::new(&server_url).expect("client");

    let response = client
        .relabel_item(&RelabelRequest {
            id: "a1".to_string(),
            item_type: ItemType::Sentence,
            index: 5,
            title_zh: "数量相关".to_string(),
            title_en: "Quantity".to_string(),
        })
        .await
        .expect("relabel");

    assert!(response.ok);
    assert!(response.library_path.is_some());
    let sent = state.relabels.lock().expect("relabels")[0].clone();
    assert_eq!(
        sent,
        json!({
            "id": "a1",
            "type": "SENTENCE",
            "index": 5,
            "title_zh": "数量相关",
            "title_en": "Quantity"
        })
    );
}

#[tokio::test]
async fn library_takes_sends_type_and_index_query() {
    let (server_url, state) = spawn_backend().await.expect("backend");
    let client = HttpIntakeClient::new(&server_url).expect("client");

    let takes = client
        .get_library_takes(ItemType::FastStory, 3)
        .await
        .expect("takes");

    assert_eq!(takes.item_type, ItemType::FastStory);
    assert_eq!(takes.index, 3);
    assert_eq!(takes.takes.len(), 1);
    let query = state.queries.lock().expect("queries")[0].clone();
    assert_eq!(query.get("type").map(String::as_str), Some("FASTSTORY"));
    assert_eq!(query.get("index").map(String::as_str), Some("3"));
}

#[tokio::test]
async fn file_bytes_are_returned_unchanged() {
    let (server_url, state) = spawn_backend().await.expect("backend");
    let client = HttpIntakeClient::new(&server_url).expect("client");

    let bytes = client
        .fetch_file_bytes("HomeworkVault/Inbox/a1 take.m4a")
        .await
        .expect("bytes");

    assert_eq!(bytes, vec![0x49, 0x44, 0x33, 0x04]);
    let query = state.queries.lock().expect("queries")[0].clone();
    assert_eq!(
        query.get("path").map(String::as_str),
        Some("HomeworkVault/Inbox/a1 take.m4a")
    );
}

#[tokio::test]
async fn apply_seed_passes_optional_seed_file() {
    let (server_url, state) = spawn_backend().await.expect("backend");
    let client = HttpIntakeClient::new(&server_url).expect("client");

    client.apply_seed_mapping(None).await.expect("default seed");
    client
        .apply_seed_mapping(Some("mappings_seed_custom.json"))
        .await
        .expect("named seed");

    let queries = state.queries.lock().expect("queries").clone();
    assert!(queries[0].is_empty());
    assert_eq!(
        queries[1].get("seed_file").map(String::as_str),
        Some("mappings_seed_custom.json")
    );
}

#[tokio::test]
async fn upload_sends_each_file_as_files_part() {
    let (server_url, state) = spawn_backend().await.expect("backend");
    let client = HttpIntakeClient::new(&server_url).expect("client");

    let summary = client
        .upload_audio(vec![
            AudioUpload::new("c07.m4a", vec![1, 2, 3]),
            AudioUpload::new("s05.wav", vec![4; 10]),
        ])
        .await
        .expect("upload");

    assert_eq!(summary.saved.len(), 2);
    let uploads = state.uploads.lock().expect("uploads").clone();
    assert_eq!(
        uploads,
        vec![
            ("files".to_string(), "c07.m4a".to_string(), 3),
            ("files".to_string(), "s05.wav".to_string(), 10),
        ]
    );
}

#[tokio::test]
async fn asr_test_sends_file_part_with_scope_and_window() {
    let (server_url, state) = spawn_backend().await.expect("backend");
    let client = HttpIntakeClient::new(&server_url).expect("client");

    let result = client
        .asr_test(
            AudioUpload::new("c07.m4a", vec![9; 6]),
            AsrTestOptions {
                scope: AsrScope::Head,
                tag_window_sec: 15,
            },
        )
        .await
        .expect("asr test");

    assert_eq!(result.engine, "faster-whisper");
    assert_eq!(result.scope.as_deref(), Some("head"));
    assert!(result.used_head_clip);
    assert_eq!(result.tag_window_text.as_deref(), Some("C seven"));
    assert_eq!(result.segments.len(), 1);

    let query = state.queries.lock().expect("queries")[0].clone();
    assert_eq!(query.get("scope").map(String::as_str), Some("head"));
    assert_eq!(query.get("tag_window_sec").map(String::as_str), Some("15"));
    let uploads = state.uploads.lock().expect("uploads").clone();
    assert_eq!(
        uploads,
        vec![("file".to_string(), "c07.m4a".to_string(), 6)]
    );
}
