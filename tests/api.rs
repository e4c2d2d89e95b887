//! Tests de integración del router HTTP.
//!
//! Se ejercita el `Router` real con `tower::ServiceExt::oneshot`, sin red:
//! sólo las rutas que fallan antes de llamar a un colaborador externo y las
//! rutas stub/constantes.

use std::sync::{Arc, Mutex};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use study_tool_rig_webapp::{
    api,
    app_state::AppState,
    config::{AppConfig, LlmProvider},
    llm::LlmManager,
};

fn test_config(templates_dir: &str) -> AppConfig {
    AppConfig {
        server_addr: "127.0.0.1:0".to_string(),
        llm_provider: LlmProvider::OpenAI,
        llm_chat_model: "gpt-4o-mini".to_string(),
        transcription_model: "whisper-1".to_string(),
        ytdlp_bin: "yt-dlp".to_string(),
        templates_dir: templates_dir.to_string(),
    }
}

fn test_router_with_templates(templates_dir: &str) -> Router {
    let config = test_config(templates_dir);
    let llm_manager = LlmManager::from_config(&config).unwrap();
    let (shutdown_tx, _shutdown_rx) = tokio::sync::oneshot::channel();
    api::create_router(AppState {
        config,
        llm_manager,
        http: reqwest::Client::new(),
        shutdown_sender: Arc::new(Mutex::new(Some(shutdown_tx))),
    })
}

fn test_router() -> Router {
    // Un directorio inexistente fuerza la página embebida en `GET /`.
    test_router_with_templates("no-such-templates-dir")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn multipart_request(uri: &str, parts: &[(&str, &str)]) -> Request<Body> {
    let boundary = "test-boundary-1a2b3c";
    let mut body = String::new();
    for (name, value) in parts {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!("--{boundary}--\r\n"));

    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn file_upload_request(uri: &str, filename: &str, contents: &[u8]) -> Request<Body> {
    let boundary = "test-boundary-9z8y7x";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

const GENERATE_ENDPOINTS: [&str; 6] = [
    "/api/generate-flashcards",
    "/api/generate-mcqs",
    "/api/generate-mindmap",
    "/api/generate-learning-path",
    "/api/generate-sticky-notes",
    "/api/generate-exam-questions",
];

#[tokio::test]
async fn generate_endpoints_without_input_return_400() {
    for endpoint in GENERATE_ENDPOINTS {
        let request = multipart_request(endpoint, &[("unrelated", "value")]);
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "endpoint {endpoint}");

        let body = body_json(response).await;
        assert_eq!(body["error"], "Please provide either a file or text");
    }
}

#[tokio::test]
async fn blank_text_field_is_rejected_as_missing_input() {
    let request = multipart_request("/api/generate-flashcards", &[("text", "   ")]);
    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unsupported_upload_format_is_client_fault() {
    let request = file_upload_request("/api/generate-mcqs", "slides.pptx", b"\x50\x4b\x03\x04");
    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains(".pptx"));
}

#[tokio::test]
async fn summarize_youtube_rejects_invalid_url() {
    let request = Request::post("/api/summarize-youtube")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "url": "https://example.com/clip" }).to_string()))
        .unwrap();
    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid YouTube URL");
}

#[tokio::test]
async fn video_info_rejects_malformed_id() {
    let request = Request::get("/api/video-info/not-an-id")
        .body(Body::empty())
        .unwrap();
    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_is_a_fixed_constant() {
    let request = Request::get("/api/health").body(Body::empty()).unwrap();
    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body, json!({ "status": "healthy", "version": "1.0.0" }));
}

#[tokio::test]
async fn supported_formats_lists_extraction_formats() {
    let request = Request::get("/api/supported-formats").body(Body::empty()).unwrap();
    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let formats: Vec<&str> = body["supported_formats"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(formats.contains(&"pdf"));
    assert!(formats.contains(&"txt"));
    assert!(!formats.contains(&"pptx"));
}

#[tokio::test]
async fn stub_endpoints_echo_their_identifiers() {
    let cases = [
        ("/api/quiz/q-77", json!({ "quiz_id": "q-77", "status": "active" })),
        ("/api/mindmap/m-1", json!({ "map_id": "m-1", "status": "ready" })),
        ("/api/learning-path/p-3", json!({ "path_id": "p-3", "status": "active" })),
        ("/api/sticky-notes/n-9", json!({ "note_id": "n-9", "status": "active" })),
        (
            "/api/exam-questions/by-type/hots",
            json!({ "question_type": "hots", "status": "filtered" }),
        ),
        (
            "/api/exam-questions/by-probability/0.7",
            json!({ "min_probability": 0.7, "status": "filtered" }),
        ),
    ];

    for (uri, expected) in cases {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "uri {uri}");
        assert_eq!(body_json(response).await, expected, "uri {uri}");
    }
}

#[tokio::test]
async fn sticky_note_category_update_echoes_without_storing() {
    let request = Request::put("/api/sticky-notes/n-4/category?category=green")
        .body(Body::empty())
        .unwrap();
    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body, json!({ "note_id": "n-4", "category": "green", "updated": true }));
}

#[tokio::test]
async fn quiz_answer_submission_returns_fixed_feedback() {
    let request = Request::post("/api/quiz/submit-answer?quiz_id=q1&question_id=x2&answer=1")
        .body(Body::empty())
        .unwrap();
    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["quiz_id"], "q1");
    assert_eq!(body["question_id"], "x2");
    assert_eq!(body["is_correct"], true);
}

#[tokio::test]
async fn mark_difficulty_fabricates_a_next_review() {
    let request =
        Request::post("/api/flashcard/mark-difficulty?flashcard_id=f1&difficulty=easy")
            .body(Body::empty())
            .unwrap();
    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["flashcard_id"], "f1");
    assert_eq!(body["difficulty"], "easy");
    assert!(body["next_review"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn analytics_stubs_return_fixed_payloads() {
    let request = Request::get("/api/analytics/study-progress")
        .body(Body::empty())
        .unwrap();
    let response = test_router().oneshot(request).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["flashcards_completed"], 0);
    assert_eq!(body["accuracy_rate"], 0.0);

    let request = Request::get("/api/analytics/performance")
        .body(Body::empty())
        .unwrap();
    let response = test_router().oneshot(request).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["weekly_progress"], json!([]));
}

#[tokio::test]
async fn homepage_falls_back_to_inline_html() {
    let request = Request::get("/").body(Body::empty()).unwrap();
    let response = test_router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let page = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(page.contains("Smart Study Tool"));
}

#[tokio::test]
async fn homepage_serves_template_file_when_present() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("index.html"),
        "<html><body>custom landing</body></html>",
    )
    .unwrap();

    let router = test_router_with_templates(dir.path().to_str().unwrap());
    let request = Request::get("/").body(Body::empty()).unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let page = String::from_utf8(bytes.to_vec()).unwrap();
    assert_eq!(page, "<html><body>custom landing</body></html>");
}
