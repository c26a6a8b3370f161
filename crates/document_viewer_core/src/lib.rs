pub mod domain;
pub mod expansion;
pub mod library;
pub mod ports;
pub mod progress;
pub mod tree;
pub mod viewer;
pub mod wire;

pub use domain::{
    ChangeEvent, ContentMap, ContentNode, Document, DocumentId, DocumentSummary, Language,
    Localized, UploadedFile,
};
pub use expansion::{ExpansionState, ViewState};
pub use library::{DocumentLibrary, SelectionEffect};
pub use ports::{ChangeStream, DocumentProcessingService, DocumentStore, PortError, PortResult};
pub use progress::{ListeningStatus, StatusBoard};
pub use tree::{
    build_outline, display_title, has_children, has_content, ordered_entries, resolve_audio,
    resolve_text, OutlineEntry,
};
pub use viewer::{FollowUp, ViewerSession};
pub use wire::{parse_content, ContentError};
