//! Shared fixtures for the service integration tests.
#![allow(dead_code)]

use api_lib::adapters::{HttpProcessorAdapter, InMemoryStore};
use api_lib::config::Config;
use api_lib::web::state::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const BOUNDARY: &str = "X-DOCUMENT-VIEWER-BOUNDARY";

/// App state backed by an in-memory store and a processor at `processor_url`.
pub fn test_state(processor_url: &str) -> Arc<AppState> {
    let config = Config::from_lookup(|key| match key {
        "STORE_BACKEND" => Some("memory".to_string()),
        "PROCESSOR_URL" => Some(processor_url.to_string()),
        _ => None,
    })
    .expect("test configuration is valid");
    let processor = HttpProcessorAdapter::new(
        config.processor_url.clone(),
        config.processor_keep_artifacts,
        Duration::from_secs(5),
    )
    .expect("client builds");

    Arc::new(AppState {
        store: Arc::new(InMemoryStore::new()),
        processor: Arc::new(processor),
        config: Arc::new(config),
        shutdown: CancellationToken::new(),
    })
}

/// Content shaped like the processing service's output.
pub fn sample_content() -> Value {
    json!({
        "1. INTRODUCTION:": {
            "text": "This method statement describes the systematic approach.",
            "hindi_text": "यह पद्धति कथन व्यवस्थित दृष्टिकोण का वर्णन करता है।",
            "subtopics": {},
            "eng_speech_url": "/audio/intro_eng.mp3",
            "hindi_speech_url": "/audio/intro_hindi.mp3"
        },
        "2. METHODOLOGY:": {
            "text": "",
            "subtopics": {
                "2.10 Curing": {
                    "text": "Curing shall continue for seven days.",
                    "eng_speech_url": "/audio/curing_eng.mp3"
                },
                "2.2 Lying of bricks": {
                    "text": "Brick laying shall follow the approved drawings.",
                    "guj_text": "ઈંટ બિછાવવાનું કામ મંજૂર નકશા અનુસાર કરવું જોઈએ।",
                    "eng_speech_url": "/audio/laying_eng.mp3",
                    "hindi_speech_url": "/audio/laying_hindi.mp3"
                }
            }
        },
        "Appendix": { "text": "Reference tables." }
    })
}

pub struct Part<'a> {
    pub name: &'a str,
    pub file: Option<(&'a str, &'a str)>,
    pub data: &'a [u8],
}

/// Encodes a multipart/form-data body using `BOUNDARY`.
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part.file {
            Some((file_name, content_type)) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        part.name, file_name, content_type
                    )
                    .as_bytes(),
                );
            }
            None => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", part.name).as_bytes(),
                );
            }
        }
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}
