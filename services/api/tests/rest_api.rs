mod common;

use api_lib::web;
use axum::body::{to_bytes, Body};
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use axum::Router;
use common::{multipart_body, sample_content, test_state, Part, BOUNDARY};
use document_viewer_core::wire::parse_content;
use serde_json::{json, Value};
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PDF: Option<(&str, &str)> = Some(("method.pdf", "application/pdf"));

async fn processor_returning(content: Value, expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": content })))
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

fn upload_request(parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/documents")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

#[tokio::test]
async fn upload_then_list_and_render_hindi_outline() {
    let processor = processor_returning(sample_content(), 1).await;
    let app = web::router(test_state(&format!("{}/upload", processor.uri())));

    let (status, created) = send(
        &app,
        upload_request(&[
            Part { name: "name", file: None, data: b"Brickwork method statement" },
            Part { name: "file", file: PDF, data: b"%PDF-1.7 fake" },
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, list) = send(&app, get("/documents")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], json!(id));
    assert_eq!(list[0]["name"], json!("Brickwork method statement"));

    let (status, outline) = send(&app, get(&format!("/documents/{}/outline?language=hindi", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outline["language"], json!("hindi"));

    let sections = outline["sections"].as_array().unwrap();
    let keys: Vec<&str> = sections.iter().map(|s| s["key"].as_str().unwrap()).collect();
    assert_eq!(keys, ["1. INTRODUCTION:", "2. METHODOLOGY:", "Appendix"]);

    let intro = &sections[0];
    assert_eq!(intro["audio_url"], json!("/audio/intro_hindi.mp3"));
    assert!(intro["text"].as_str().unwrap().starts_with("यह"));

    let methodology = &sections[1];
    assert_eq!(methodology["has_content"], json!(false));
    let subtopics = methodology["children"].as_array().unwrap();
    assert_eq!(subtopics[0]["key"], json!("2.2 Lying of bricks"));
    assert_eq!(subtopics[1]["key"], json!("2.10 Curing"));
    // Text falls back to the default language; audio never does.
    assert_eq!(subtopics[1]["text"], json!("Curing shall continue for seven days."));
    assert_eq!(subtopics[1]["audio_url"], Value::Null);
    assert_eq!(subtopics[0]["audio_url"], json!("/audio/laying_hindi.mp3"));
}

#[tokio::test]
async fn upload_without_name_never_reaches_the_processor() {
    let processor = processor_returning(sample_content(), 0).await;
    let app = web::router(test_state(&format!("{}/upload", processor.uri())));

    let (status, _) = send(
        &app,
        upload_request(&[
            Part { name: "name", file: None, data: b"   " },
            Part { name: "file", file: PDF, data: b"%PDF-1.7 fake" },
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        upload_request(&[Part { name: "file", file: PDF, data: b"%PDF-1.7 fake" }]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, list) = send(&app, get("/documents")).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn upload_rejects_missing_file_and_unsupported_types() {
    let processor = processor_returning(sample_content(), 0).await;
    let app = web::router(test_state(&format!("{}/upload", processor.uri())));

    let (status, _) = send(
        &app,
        upload_request(&[
            Part { name: "name", file: None, data: b"Notes" },
            Part { name: "file", file: Some(("notes.txt", "text/plain")), data: b"plain text" },
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        upload_request(&[Part { name: "name", file: None, data: b"Notes" }]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn processor_failure_is_a_bad_gateway_and_stores_nothing() {
    let processor = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(500).set_body_string("conversion failed"))
        .expect(1)
        .mount(&processor)
        .await;
    let app = web::router(test_state(&format!("{}/upload", processor.uri())));

    let (status, _) = send(
        &app,
        upload_request(&[
            Part { name: "name", file: None, data: b"Broken" },
            Part { name: "file", file: PDF, data: b"%PDF-1.7 fake" },
        ]),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, list) = send(&app, get("/documents")).await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn get_and_delete_report_unknown_documents() {
    let state = test_state("http://127.0.0.1:9/upload");
    let id = state
        .store
        .create_document("Method", &parse_content(&sample_content()).unwrap())
        .await
        .unwrap();
    let app = web::router(state);

    let (status, document) = send(&app, get(&format!("/documents/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        document["content"]["2. METHODOLOGY:"]["subtopics"]["2.10 Curing"]["text"],
        json!("Curing shall continue for seven days.")
    );

    let delete = || {
        Request::builder()
            .method("DELETE")
            .uri(format!("/documents/{}", id))
            .body(Body::empty())
            .unwrap()
    };
    let (status, _) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, delete()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get(&format!("/documents/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn share_link_resolves_named_or_newest_document() {
    let state = test_state("http://127.0.0.1:9/upload");
    let app = web::router(state.clone());

    let (status, _) = send(&app, get("/share")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let root = parse_content(&sample_content()).unwrap();
    let older = state.store.create_document("Older", &root).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let newer = state.store.create_document("Newer", &root).await.unwrap();

    let (status, shared) = send(&app, get("/share")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shared["id"], json!(newer.to_string()));

    let (status, shared) = send(&app, get(&format!("/share?doc={}", older))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(shared["name"], json!("Older"));

    let (status, _) = send(&app, get(&format!("/share?doc={}", uuid::Uuid::new_v4()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn replace_validates_name_and_content() {
    let state = test_state("http://127.0.0.1:9/upload");
    let id = state
        .store
        .create_document("Draft", &parse_content(&sample_content()).unwrap())
        .await
        .unwrap();
    let app = web::router(state);

    let put = |body: Value| {
        Request::builder()
            .method("PUT")
            .uri(format!("/documents/{}", id))
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let (status, updated) = send(
        &app,
        put(json!({
            "name": "Final",
            "content": { "1. Scope": { "text": "Only brickwork." } }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], json!("Final"));
    assert_eq!(updated["content"]["1. Scope"]["text"], json!("Only brickwork."));
    assert!(updated["content"].get("2. METHODOLOGY:").is_none());

    let (status, _) = send(&app, put(json!({ "name": " ", "content": {} }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, put(json!({ "name": "Final", "content": ["not", "a", "map"] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_outline_language_is_rejected() {
    let state = test_state("http://127.0.0.1:9/upload");
    let id = state
        .store
        .create_document("Method", &parse_content(&sample_content()).unwrap())
        .await
        .unwrap();
    let app = web::router(state);

    let (status, _) = send(&app, get(&format!("/documents/{}/outline?language=klingon", id))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, outline) = send(&app, get(&format!("/documents/{}/outline?language=gu", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(outline["language"], json!("gujarati"));
}
