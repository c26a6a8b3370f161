//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::web::state::AppState;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use document_viewer_core::domain::{Document, DocumentSummary, Language, UploadedFile};
use document_viewer_core::ports::PortError;
use document_viewer_core::tree::{build_outline, OutlineEntry};
use document_viewer_core::wire::{content_to_value, parse_content};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{IntoParams, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        list_documents_handler,
        upload_document_handler,
        get_document_handler,
        replace_document_handler,
        delete_document_handler,
        outline_handler,
        share_handler,
    ),
    components(
        schemas(
            DocumentSummaryResponse,
            DocumentResponse,
            CreateDocumentResponse,
            ReplaceDocumentRequest,
            OutlineResponse,
        )
    ),
    tags(
        (name = "Document Viewer API", description = "API endpoints for the multilingual audio document viewer.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A row of the document list.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct DocumentSummaryResponse {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DocumentSummary> for DocumentSummaryResponse {
    fn from(summary: DocumentSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            created_at: summary.created_at,
            updated_at: summary.updated_at,
        }
    }
}

/// A full document; `content` is the section tree in the processing service's layout.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub name: String,
    #[schema(value_type = Object)]
    pub content: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Document> for DocumentResponse {
    fn from(document: Document) -> Self {
        Self {
            content: content_to_value(&document.root),
            id: document.id,
            name: document.name,
            created_at: document.created_at,
            updated_at: document.updated_at,
        }
    }
}

/// The response payload sent after a document was processed and stored.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct CreateDocumentResponse {
    pub id: Uuid,
}

/// Replaces a document's name and content.
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ReplaceDocumentRequest {
    pub name: String,
    #[schema(value_type = Object)]
    pub content: serde_json::Value,
}

/// A document's sections in display order, resolved for one language.
#[derive(Serialize, ToSchema)]
pub struct OutlineResponse {
    pub document_id: Uuid,
    pub name: String,
    #[schema(value_type = String)]
    pub language: Language,
    #[schema(value_type = Vec<Object>)]
    pub sections: Vec<OutlineEntry>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OutlineQuery {
    /// `default`/`english`, `hindi` or `gujarati`.
    pub language: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ShareQuery {
    /// The shared document's id. Without it, the newest document is returned.
    pub doc: Option<Uuid>,
}

type HandlerError = (StatusCode, String);

/// Maps a port failure to the HTTP status the client sees.
pub fn port_error_response(e: PortError) -> HandlerError {
    let status = match &e {
        PortError::Validation(_) => StatusCode::BAD_REQUEST,
        PortError::Upload(_) => StatusCode::BAD_GATEWAY,
        PortError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        PortError::NotFound(_) => StatusCode::NOT_FOUND,
    };
    if status.is_server_error() {
        error!("Request failed: {:?}", e);
    }
    (status, e.to_string())
}

const ACCEPTED_TYPES: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
];

/// Checks that an upload is a PDF or Word document, trusting the file
/// extension when the browser sent a generic content type.
fn accepted_content_type(file_name: &str, content_type: Option<&str>) -> Option<&'static str> {
    let by_type =
        content_type.and_then(|ct| ACCEPTED_TYPES.iter().find(|(_, mime)| *mime == ct));
    let by_extension = || {
        let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        ACCEPTED_TYPES.iter().find(|(ext, _)| *ext == extension)
    };
    by_type.or_else(by_extension).map(|(_, mime)| *mime)
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// List all documents, newest first.
#[utoipa::path(
    get,
    path = "/documents",
    responses(
        (status = 200, description = "Document list", body = [DocumentSummaryResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_documents_handler(
    State(app_state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let documents = app_state
        .store
        .list_documents()
        .await
        .map_err(port_error_response)?;
    let body: Vec<DocumentSummaryResponse> = documents.into_iter().map(Into::into).collect();
    Ok(Json(body))
}

/// Upload a document for processing and store the result.
///
/// Accepts a multipart/form-data request with a `file` part (PDF or Word)
/// and a `name` part.
#[utoipa::path(
    post,
    path = "/documents",
    request_body(content_type = "multipart/form-data", description = "The document file and its display name."),
    responses(
        (status = 201, description = "Document processed and stored", body = CreateDocumentResponse),
        (status = 400, description = "Missing file or name, or unsupported file type"),
        (status = 502, description = "The processing service failed"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn upload_document_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HandlerError> {
    let mut file: Option<UploadedFile> = None;
    let mut name: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {}", e),
        )
    })? {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("document").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read file bytes: {}", e),
                    )
                })?;
                let content_type = accepted_content_type(&file_name, content_type.as_deref())
                    .ok_or_else(|| {
                        port_error_response(PortError::Validation(
                            "Please upload a PDF or Word document.".to_string(),
                        ))
                    })?;
                file = Some(UploadedFile {
                    file_name,
                    content_type: content_type.to_string(),
                    bytes,
                });
            }
            Some("name") => {
                let text = field.text().await.map_err(|e| {
                    (
                        StatusCode::BAD_REQUEST,
                        format!("Failed to read document name: {}", e),
                    )
                })?;
                name = Some(text);
            }
            _ => {}
        }
    }

    let file = file
        .filter(|f| !f.bytes.is_empty())
        .ok_or_else(|| port_error_response(PortError::Validation("A file is required.".to_string())))?;
    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            port_error_response(PortError::Validation("A document name is required.".to_string()))
        })?;

    let root = app_state
        .processor
        .process_document(&file)
        .await
        .map_err(port_error_response)?;
    let id = app_state
        .store
        .create_document(&name, &root)
        .await
        .map_err(port_error_response)?;

    info!("Stored document '{}' as {} ({} sections)", name, id, root.len());
    Ok((StatusCode::CREATED, Json(CreateDocumentResponse { id })))
}

/// Fetch a document with its full content.
#[utoipa::path(
    get,
    path = "/documents/{id}",
    params(("id" = Uuid, Path, description = "Document id")),
    responses(
        (status = 200, description = "The document", body = DocumentResponse),
        (status = 404, description = "No such document")
    )
)]
pub async fn get_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let document = app_state
        .store
        .get_document(id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(DocumentResponse::from(document)))
}

/// Replace a document's name and content.
#[utoipa::path(
    put,
    path = "/documents/{id}",
    params(("id" = Uuid, Path, description = "Document id")),
    request_body = ReplaceDocumentRequest,
    responses(
        (status = 200, description = "The updated document", body = DocumentResponse),
        (status = 400, description = "Blank name or malformed content"),
        (status = 404, description = "No such document")
    )
)]
pub async fn replace_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(request): Json<ReplaceDocumentRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(port_error_response(PortError::Validation(
            "A document name is required.".to_string(),
        )));
    }
    let root = parse_content(&request.content)
        .map_err(|e| port_error_response(PortError::Validation(e.to_string())))?;
    let document = app_state
        .store
        .replace_document(id, name, &root)
        .await
        .map_err(port_error_response)?;
    Ok(Json(DocumentResponse::from(document)))
}

/// Delete a document.
#[utoipa::path(
    delete,
    path = "/documents/{id}",
    params(("id" = Uuid, Path, description = "Document id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No such document")
    )
)]
pub async fn delete_document_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    app_state
        .store
        .delete_document(id)
        .await
        .map_err(port_error_response)?;
    info!("Deleted document {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// A document's sections in display order for one language.
#[utoipa::path(
    get,
    path = "/documents/{id}/outline",
    params(("id" = Uuid, Path, description = "Document id"), OutlineQuery),
    responses(
        (status = 200, description = "Ordered, localized sections", body = OutlineResponse),
        (status = 400, description = "Unknown language"),
        (status = 404, description = "No such document")
    )
)]
pub async fn outline_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<OutlineQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let language = match query.language.as_deref() {
        Some(raw) => raw
            .parse::<Language>()
            .map_err(|e| port_error_response(PortError::Validation(e.to_string())))?,
        None => Language::Default,
    };
    let document = app_state
        .store
        .get_document(id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(OutlineResponse {
        document_id: document.id,
        sections: build_outline(&document.root, language),
        name: document.name,
        language,
    }))
}

/// Resolve a shareable link: the document named by `doc`, or the newest one.
#[utoipa::path(
    get,
    path = "/share",
    params(ShareQuery),
    responses(
        (status = 200, description = "The shared document", body = DocumentResponse),
        (status = 404, description = "No such document, or no documents at all")
    )
)]
pub async fn share_handler(
    State(app_state): State<Arc<AppState>>,
    Query(query): Query<ShareQuery>,
) -> Result<impl IntoResponse, HandlerError> {
    let id = match query.doc {
        Some(id) => id,
        None => app_state
            .store
            .list_documents()
            .await
            .map_err(port_error_response)?
            .first()
            .map(|doc| doc.id)
            .ok_or_else(|| {
                port_error_response(PortError::NotFound("No documents have been uploaded.".to_string()))
            })?,
    };
    let document = app_state
        .store
        .get_document(id)
        .await
        .map_err(port_error_response)?;
    Ok(Json(DocumentResponse::from(document)))
}
