//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server
//! for the document viewer.

use document_viewer_core::domain::{DocumentSummary, Language};
use document_viewer_core::expansion::{ExpansionState, ViewState};
use document_viewer_core::progress::ListeningStatus;
use document_viewer_core::tree::OutlineEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Opens the viewer. This must be the first message sent on the connection.
    /// Without a `document_id` the most recently created document is shown.
    Init {
        #[serde(default)]
        document_id: Option<Uuid>,
        #[serde(default)]
        language: Option<Language>,
    },

    SelectDocument { document_id: Uuid },

    DeleteDocument { document_id: Uuid },

    SetLanguage { language: Language },

    /// Expands or collapses a top-level section.
    ToggleSection { key: String },

    /// Activates a subtopic under `parent`, or collapses it if already active.
    SelectSubtopic { parent: String, key: String },

    ToggleDescription { key: String },

    /// Reports the audio player's position for a node, in seconds.
    Progress { key: String, position: f64, duration: f64 },
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the viewer session is ready.
    SessionInitialized { language: Language },

    /// The full document list, newest first, and which one is selected.
    Library {
        documents: Vec<DocumentSummary>,
        selected: Option<Uuid>,
    },

    /// Everything needed to render the open document.
    DocumentView {
        document_id: Uuid,
        name: String,
        language: Language,
        outline: Vec<OutlineEntry>,
        view: ViewState,
        statuses: HashMap<String, ListeningStatus>,
    },

    /// There is no document to show; the client should offer an upload.
    NoDocument,

    SectionToggled { key: String, state: ExpansionState },

    SubtopicSelected {
        parent: String,
        key: String,
        state: ExpansionState,
    },

    DescriptionToggled { key: String, open: bool },

    StatusChanged { key: String, status: ListeningStatus },

    /// Reports a failed request. The session stays usable.
    Error { message: String },
}
