//! services/api/src/adapters/processor.rs
//!
//! This module contains the adapter for the remote document-processing
//! service. It implements the `DocumentProcessingService` port from the `core`
//! crate: the file goes out as a multipart form and the section tree comes
//! back under the response's `data` field.

use async_trait::async_trait;
use document_viewer_core::domain::{ContentMap, UploadedFile};
use document_viewer_core::ports::{DocumentProcessingService, PortError, PortResult};
use document_viewer_core::wire::parse_content;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `DocumentProcessingService` port over HTTP.
#[derive(Clone)]
pub struct HttpProcessorAdapter {
    client: reqwest::Client,
    endpoint: String,
    keep_artifacts: bool,
}

impl HttpProcessorAdapter {
    /// Creates a new `HttpProcessorAdapter`. Requests that run longer than
    /// `timeout` fail with an upload error.
    pub fn new(
        endpoint: impl Into<String>,
        keep_artifacts: bool,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            keep_artifacts,
        })
    }
}

#[derive(Deserialize)]
struct ProcessResponse {
    data: serde_json::Value,
}

//=========================================================================================
// `DocumentProcessingService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentProcessingService for HttpProcessorAdapter {
    async fn process_document(&self, file: &UploadedFile) -> PortResult<ContentMap> {
        let part = Part::bytes(file.bytes.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| PortError::Upload(format!("Invalid content type: {}", e)))?;
        let form = Form::new()
            .part("file", part)
            .text("keep_intermediate", self.keep_artifacts.to_string());

        info!("Sending '{}' ({} bytes) for processing", file.file_name, file.bytes.len());
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| PortError::Upload(format!("Processing service unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Processing service returned {}: {}", status, body);
            return Err(PortError::Upload(format!(
                "Processing service returned {}",
                status
            )));
        }

        let body: ProcessResponse = response
            .json()
            .await
            .map_err(|e| PortError::Upload(format!("Unreadable processing response: {}", e)))?;

        parse_content(&body.data)
            .map_err(|e| PortError::Upload(format!("Processing service returned unusable content: {}", e)))
    }
}
