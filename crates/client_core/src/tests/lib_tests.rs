use super::*;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode as HttpStatus,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Debug, Clone, Default)]
struct RecordedUpload {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
    module_name: Option<String>,
}

#[derive(Clone, Default)]
struct ServerState {
    uploads: Arc<Mutex<Vec<RecordedUpload>>>,
    asks: Arc<Mutex<Vec<AskRequest>>>,
    deleted: Arc<Mutex<Vec<i64>>>,
}

async fn handle_list_modules() -> Json<Value> {
    Json(json!({
        "modules": [
            {"id": 2, "filename": "lecture2.pdf", "module_name": "lecture2", "upload_date": "2024-01-02 10:00:00"},
            {"id": 1, "filename": "lecture1.pdf", "module_name": "lecture1", "upload_date": "2024-01-01 09:00:00"}
        ]
    }))
}

async fn handle_upload(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> (HttpStatus, Json<Value>) {
    let mut recorded = RecordedUpload::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                recorded.file_name = field.file_name().map(str::to_string);
                recorded.content_type = field.content_type().map(str::to_string);
                recorded.bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
            }
            Some("module_name") => {
                recorded.module_name = field.text().await.ok();
            }
            _ => {}
        }
    }
    let rejected = recorded.module_name.as_deref() == Some("rejected");
    state.uploads.lock().await.push(recorded);
    if rejected {
        return (HttpStatus::OK, Json(json!({"message": "not stored"})));
    }
    (
        HttpStatus::CREATED,
        Json(json!({"success": true, "pdf_id": 3, "message": "PDF uploaded successfully"})),
    )
}

async fn handle_delete_module(
    State(state): State<ServerState>,
    Path(module_id): Path<i64>,
) -> (HttpStatus, Json<Value>) {
    if module_id == 404 {
        return (
            HttpStatus::NOT_FOUND,
            Json(json!({"error": "Module not found"})),
        );
    }
    state.deleted.lock().await.push(module_id);
    (
        HttpStatus::OK,
        Json(json!({"success": true, "message": "Module deleted"})),
    )
}

async fn handle_module_detail(Path(module_id): Path<i64>) -> Json<Value> {
    Json(json!({
        "id": module_id,
        "filename": "lecture1.pdf",
        "module_name": "lecture1",
        "content": "Chapter 1. X is a thing."
    }))
}

async fn handle_conversations(Path(module_id): Path<i64>) -> (HttpStatus, Json<Value>) {
    match module_id {
        500 => (
            HttpStatus::INTERNAL_SERVER_ERROR,
            Json(json!({"error": "database is locked"})),
        ),
        99 => {
            tokio::time::sleep(std::time::Duration::from_secs(2)).await;
            (HttpStatus::OK, Json(json!({"conversations": []})))
        }
        _ => (
            HttpStatus::OK,
            Json(json!({
                "conversations": [
                    {"question": "What is Y?", "answer": "Y is...", "timestamp": "2024-01-02 00:00:00"},
                    {"question": "What is X?", "answer": "X is...", "timestamp": "2024-01-01 00:00:00"}
                ]
            })),
        ),
    }
}

async fn handle_ask(
    State(state): State<ServerState>,
    Json(payload): Json<AskRequest>,
) -> (HttpStatus, Json<Value>) {
    let question = payload.question.clone();
    state.asks.lock().await.push(payload);
    if question == "unanswered" {
        return (HttpStatus::OK, Json(json!({"question": question})));
    }
    (
        HttpStatus::OK,
        Json(json!({"success": true, "question": question, "answer": "X is..."})),
    )
}

async fn handle_health() -> Json<Value> {
    Json(json!({"status": "ok", "message": "Educational Content Assistant API running"}))
}

async fn spawn_study_server() -> (String, ServerState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/health", get(handle_health))
        .route("/api/modules", get(handle_list_modules))
        .route(
            "/api/modules/:id",
            get(handle_module_detail).delete(handle_delete_module),
        )
        .route("/api/upload", post(handle_upload))
        .route("/api/conversations/:id", get(handle_conversations))
        .route("/api/ask", post(handle_ask))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/api"), state)
}

fn pdf_upload(file_name: &str, module_name: &str, bytes: &[u8]) -> UploadRequest {
    UploadRequest {
        file_name: file_name.to_string(),
        module_name: module_name.to_string(),
        content_type: "application/pdf".to_string(),
        bytes: bytes.to_vec(),
    }
}

fn client_for(base_url: &str) -> StudyClient {
    StudyClient::new(ClientConfig {
        base_url: base_url.to_string(),
        request_timeout: None,
    })
    .expect("client")
}

#[tokio::test]
async fn list_modules_returns_server_order() {
    let (base_url, _) = spawn_study_server().await;
    let modules = client_for(&base_url).list_modules().await.expect("modules");

    let ids: Vec<_> = modules.iter().map(|module| module.id).collect();
    assert_eq!(ids, vec![ModuleId(2), ModuleId(1)]);
    assert_eq!(modules[1].module_name, "lecture1");
    assert_eq!(modules[1].filename.as_deref(), Some("lecture1.pdf"));
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_tolerated() {
    let (base_url, _) = spawn_study_server().await;
    let client = client_for(&format!("{base_url}/"));
    assert_eq!(client.base_url(), base_url);
    assert!(client.health().await.expect("health").is_ok());
}

#[tokio::test]
async fn upload_sends_multipart_file_and_module_name() {
    let (base_url, state) = spawn_study_server().await;
    let response = client_for(&base_url)
        .upload_module(pdf_upload("lecture1.pdf", "lecture1", b"%PDF-1.4 test"))
        .await
        .expect("upload");
    assert!(response.success);
    assert_eq!(response.pdf_id, Some(ModuleId(3)));

    let uploads = state.uploads.lock().await;
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].file_name.as_deref(), Some("lecture1.pdf"));
    assert_eq!(uploads[0].content_type.as_deref(), Some("application/pdf"));
    assert_eq!(uploads[0].module_name.as_deref(), Some("lecture1"));
    assert_eq!(uploads[0].bytes, b"%PDF-1.4 test".to_vec());
}

#[tokio::test]
async fn upload_without_success_flag_is_rejected() {
    let (base_url, _) = spawn_study_server().await;
    let err = client_for(&base_url)
        .upload_module(pdf_upload("x.pdf", "rejected", b""))
        .await
        .expect_err("should be rejected");
    assert!(matches!(err, TransportError::Rejected { operation: "upload" }));
}

#[tokio::test]
async fn delete_hits_module_path() {
    let (base_url, state) = spawn_study_server().await;
    client_for(&base_url)
        .delete_module(ModuleId(7))
        .await
        .expect("delete");
    assert_eq!(*state.deleted.lock().await, vec![7]);
}

#[tokio::test]
async fn delete_of_missing_module_carries_server_message() {
    let (base_url, _) = spawn_study_server().await;
    let err = client_for(&base_url)
        .delete_module(ModuleId(404))
        .await
        .expect_err("should fail");
    match err {
        TransportError::Status { status, message } => {
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert_eq!(message, "Module not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn conversations_are_returned_unmodified() {
    let (base_url, _) = spawn_study_server().await;
    let entries = client_for(&base_url)
        .list_conversations(ModuleId(1))
        .await
        .expect("conversations");
    let questions: Vec<_> = entries.iter().map(|e| e.question.as_str()).collect();
    assert_eq!(questions, vec!["What is Y?", "What is X?"]);
}

#[tokio::test]
async fn server_error_on_conversations_is_a_status_error() {
    let (base_url, _) = spawn_study_server().await;
    let err = client_for(&base_url)
        .list_conversations(ModuleId(500))
        .await
        .expect_err("should fail");
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert!(err.to_string().contains("database is locked"));
}

#[tokio::test]
async fn ask_posts_pdf_id_and_question() {
    let (base_url, state) = spawn_study_server().await;
    let response = client_for(&base_url)
        .ask(ModuleId(1), "What is X?")
        .await
        .expect("ask");
    assert_eq!(response.answer.as_deref(), Some("X is..."));

    let asks = state.asks.lock().await;
    assert_eq!(asks.len(), 1);
    assert_eq!(asks[0].pdf_id, ModuleId(1));
    assert_eq!(asks[0].question, "What is X?");
}

#[tokio::test]
async fn ask_without_success_flag_is_rejected() {
    let (base_url, _) = spawn_study_server().await;
    let err = client_for(&base_url)
        .ask(ModuleId(1), "unanswered")
        .await
        .expect_err("should be rejected");
    assert!(matches!(err, TransportError::Rejected { operation: "ask" }));
}

#[tokio::test]
async fn module_detail_reads_extracted_content() {
    let (base_url, _) = spawn_study_server().await;
    let detail = client_for(&base_url)
        .module_detail(ModuleId(1))
        .await
        .expect("detail");
    assert_eq!(detail.id, ModuleId(1));
    assert!(detail.content.starts_with("Chapter 1."));
}

#[tokio::test]
async fn configured_timeout_bounds_a_slow_request() {
    let (base_url, _) = spawn_study_server().await;
    let client = StudyClient::new(ClientConfig {
        base_url,
        request_timeout: Some(Duration::from_millis(100)),
    })
    .expect("client");
    let err = client
        .list_conversations(ModuleId(99))
        .await
        .expect_err("should time out");
    match err {
        TransportError::Request(inner) => assert!(inner.is_timeout()),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_server_is_a_request_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = client_for(&format!("http://{addr}/api"))
        .list_modules()
        .await
        .expect_err("should fail");
    assert!(matches!(err, TransportError::Request(_)));
}

#[test]
fn invalid_base_url_is_reported() {
    let Err(err) = StudyClient::new(ClientConfig {
        base_url: "not a url".to_string(),
        request_timeout: None,
    }) else {
        panic!("expected invalid url");
    };
    assert!(matches!(err, TransportError::InvalidUrl { .. }));
}

#[test]
fn endpoints_are_joined_as_path_segments() {
    let client = client_for("http://study.test:5000/api/");
    assert_eq!(
        client
            .endpoint(&["modules", &ModuleId(7).to_string()])
            .expect("endpoint")
            .as_str(),
        "http://study.test:5000/api/modules/7"
    );

    let bare = client_for("http://study.test:5000");
    assert_eq!(
        bare.endpoint(&["health"]).expect("endpoint").as_str(),
        "http://study.test:5000/health"
    );
}

#[test]
fn base_url_without_path_support_is_rejected() {
    let Err(err) = StudyClient::new(ClientConfig {
        base_url: "mailto:study@example.com".to_string(),
        request_timeout: None,
    }) else {
        panic!("expected unsupported base url");
    };
    assert!(matches!(err, TransportError::UnsupportedBaseUrl(_)));
}
