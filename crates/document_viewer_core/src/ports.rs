//! crates/document_viewer_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! core independent of the database and of the remote processing service.

use crate::domain::{ChangeEvent, ContentMap, Document, DocumentId, DocumentSummary, UploadedFile};
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error type for all port operations. Each variant is recoverable: the
/// caller reports it and returns to a stable state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    /// Input was rejected before any remote call was made.
    #[error("Validation failed: {0}")]
    Validation(String),
    /// The processing service could not be reached or refused the document.
    #[error("Upload failed: {0}")]
    Upload(String),
    /// The document store rejected the operation.
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Item not found: {0}")]
    NotFound(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// Change notifications from the store. Dropping the stream unsubscribes.
pub type ChangeStream = Pin<Box<dyn Stream<Item = ChangeEvent> + Send>>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents, newest created first.
    async fn list_documents(&self) -> PortResult<Vec<DocumentSummary>>;

    async fn create_document(&self, name: &str, root: &ContentMap) -> PortResult<DocumentId>;

    /// Fails with `PortError::NotFound` when `id` does not resolve.
    async fn get_document(&self, id: DocumentId) -> PortResult<Document>;

    /// Replaces a document's name and content wholesale.
    async fn replace_document(
        &self,
        id: DocumentId,
        name: &str,
        root: &ContentMap,
    ) -> PortResult<Document>;

    async fn delete_document(&self, id: DocumentId) -> PortResult<()>;

    /// Subscribes to inserts, updates and deletes made by any session.
    fn subscribe(&self) -> ChangeStream;
}

#[async_trait]
pub trait DocumentProcessingService: Send + Sync {
    /// Sends a document for processing and returns its content tree.
    async fn process_document(&self, file: &UploadedFile) -> PortResult<ContentMap>;
}
