//! services/api/src/web/state.rs
//!
//! Defines the application's shared and session-specific states.

use crate::config::Config;
use crate::web::protocol::ServerMessage;
use document_viewer_core::domain::{DocumentId, Language};
use document_viewer_core::library::DocumentLibrary;
use document_viewer_core::ports::{DocumentProcessingService, DocumentStore, PortError, PortResult};
use document_viewer_core::viewer::ViewerSession;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub processor: Arc<dyn DocumentProcessingService>,
    pub config: Arc<Config>,
    /// Cancelled when the server begins shutting down.
    pub shutdown: CancellationToken,
}

//=========================================================================================
// SessionState (Specific to One WebSocket Connection)
//=========================================================================================

/// The state for a single, active WebSocket connection.
pub struct SessionState {
    pub viewer: ViewerSession,
}

impl SessionState {
    /// Creates a new `SessionState` by loading the document list and opening
    /// the requested document, or the newest one when none is requested.
    ///
    /// Never fails: every error met along the way is returned for reporting,
    /// and the session falls back to the newest document, then to none.
    pub async fn new(
        app_state: &AppState,
        requested: Option<DocumentId>,
        language: Language,
    ) -> (Self, Vec<PortError>) {
        let mut failures = Vec::new();
        let summaries = app_state.store.list_documents().await.unwrap_or_else(|e| {
            warn!("Could not list documents: {:?}", e);
            failures.push(e);
            Vec::new()
        });
        let mut state = Self {
            viewer: ViewerSession::new(DocumentLibrary::new(summaries), language),
        };

        let Some(id) = state.viewer.library().resolve_link(requested) else {
            return (state, failures);
        };
        if let Err(e) = state.open(app_state, id).await {
            warn!("Could not open document {}: {:?}", id, e);
            failures.push(e);
            if let Some(newest) = state.viewer.library().newest().filter(|n| *n != id) {
                if let Err(e) = state.open(app_state, newest).await {
                    warn!("Could not open newest document {}: {:?}", newest, e);
                    failures.push(e);
                }
            }
        }
        if state.viewer.current().is_none() {
            state.viewer.close();
        }
        (state, failures)
    }

    /// Fetches and opens a document.
    pub async fn open(&mut self, app_state: &AppState, id: DocumentId) -> PortResult<()> {
        let document = app_state.store.get_document(id).await?;
        self.viewer.open(document);
        Ok(())
    }

    pub fn library_message(&self) -> ServerMessage {
        let library = self.viewer.library();
        ServerMessage::Library {
            documents: library.documents().to_vec(),
            selected: library.selected(),
        }
    }

    /// The render message for the open document, or `NoDocument`.
    pub fn view_message(&self) -> ServerMessage {
        match self.viewer.current() {
            Some(document) => ServerMessage::DocumentView {
                document_id: document.id,
                name: document.name.clone(),
                language: self.viewer.language(),
                outline: self.viewer.outline(),
                view: self.viewer.view().clone(),
                statuses: self.viewer.statuses(),
            },
            None => ServerMessage::NoDocument,
        }
    }
}
