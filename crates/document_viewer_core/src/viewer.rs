//! crates/document_viewer_core/src/viewer.rs
//!
//! A single viewer's session: the document list, the open document, the
//! chosen language, what is expanded and how far each node has been heard.

use crate::domain::{ChangeEvent, ContentMap, Document, DocumentId, Language};
use crate::expansion::{ExpansionState, ViewState};
use crate::library::{DocumentLibrary, SelectionEffect};
use crate::ports::{PortError, PortResult};
use crate::progress::{progress_percent, ListeningStatus, StatusBoard};
use crate::tree::{build_outline, find_node, OutlineEntry};
use std::collections::HashMap;
use std::sync::Arc;

/// What the owner of a session has to do after a library change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    Nothing,
    /// The open document changed in place; re-render it.
    Rerender,
    /// The open document is gone; fetch and open this one instead.
    Open(DocumentId),
    /// Nothing is left to show.
    ShowEmpty,
}

#[derive(Debug, Default)]
pub struct ViewerSession {
    library: DocumentLibrary,
    current: Option<Arc<Document>>,
    language: Language,
    view: ViewState,
    statuses: HashMap<DocumentId, StatusBoard>,
}

impl ViewerSession {
    pub fn new(library: DocumentLibrary, language: Language) -> Self {
        Self {
            library,
            language,
            ..Default::default()
        }
    }

    pub fn library(&self) -> &DocumentLibrary {
        &self.library
    }

    pub fn current(&self) -> Option<&Arc<Document>> {
        self.current.as_ref()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn outline(&self) -> Vec<OutlineEntry> {
        self.current
            .as_ref()
            .map(|doc| build_outline(&doc.root, self.language))
            .unwrap_or_default()
    }

    /// Statuses recorded for the open document.
    pub fn statuses(&self) -> HashMap<String, ListeningStatus> {
        self.current
            .as_ref()
            .and_then(|doc| self.statuses.get(&doc.id))
            .map(StatusBoard::snapshot)
            .unwrap_or_default()
    }

    /// Opens a freshly fetched document and resets the view to its initial
    /// state. Statuses recorded earlier for the same document are kept.
    pub fn open(&mut self, document: Document) {
        self.library.upsert(document.summary());
        self.library.select(document.id);
        self.view = ViewState::new(&document.root);
        self.current = Some(Arc::new(document));
    }

    pub fn close(&mut self) {
        self.library.clear_selection();
        self.current = None;
        self.view = ViewState::default();
    }

    fn root(&self) -> PortResult<&ContentMap> {
        self.current
            .as_ref()
            .map(|doc| &doc.root)
            .ok_or_else(|| PortError::NotFound("no document is open".to_string()))
    }

    pub fn toggle_section(&mut self, key: &str) -> PortResult<ExpansionState> {
        if !self.root()?.contains_key(key) {
            return Err(PortError::NotFound(format!("section '{}'", key)));
        }
        Ok(self.view.toggle_section(key))
    }

    pub fn select_subtopic(&mut self, parent: &str, subtopic: &str) -> PortResult<ExpansionState> {
        let parent_node = find_node(self.root()?, parent)
            .ok_or_else(|| PortError::NotFound(format!("section '{}'", parent)))?;
        if !parent_node.children.contains_key(subtopic) {
            return Err(PortError::NotFound(format!(
                "subtopic '{}' under '{}'",
                subtopic, parent
            )));
        }
        Ok(self.view.select_subtopic(parent, subtopic))
    }

    pub fn toggle_description(&mut self, key: &str) -> PortResult<bool> {
        if find_node(self.root()?, key).is_none() {
            return Err(PortError::NotFound(format!("node '{}'", key)));
        }
        Ok(self.view.toggle_description(key))
    }

    /// Records a playback position for a node's audio. Returns the new status
    /// when it changed.
    pub fn record_progress(
        &mut self,
        key: &str,
        position_secs: f64,
        duration_secs: f64,
    ) -> PortResult<Option<ListeningStatus>> {
        let root = self.root()?;
        if find_node(root, key).is_none() {
            return Err(PortError::NotFound(format!("node '{}'", key)));
        }
        let Some(percent) = progress_percent(position_secs, duration_secs) else {
            return Ok(None);
        };
        let Some(document_id) = self.current.as_ref().map(|doc| doc.id) else {
            return Ok(None);
        };
        Ok(self
            .statuses
            .entry(document_id)
            .or_default()
            .record_progress(key, percent))
    }

    /// Forgets a document that was deleted, moving the selection if needed.
    pub fn remove_document(&mut self, id: DocumentId) -> FollowUp {
        self.statuses.remove(&id);
        let effect = self.library.remove(id);
        self.follow_up(effect, None)
    }

    /// Folds a store notification into the session.
    pub fn apply_change(&mut self, event: ChangeEvent) -> FollowUp {
        if let ChangeEvent::Deleted { id } = &event {
            self.statuses.remove(id);
        }
        let effect = self.library.apply(&event);
        let replacement = match event {
            ChangeEvent::Inserted(doc) | ChangeEvent::Updated(doc) => Some(doc),
            ChangeEvent::Deleted { .. } => None,
        };
        self.follow_up(effect, replacement)
    }

    fn follow_up(&mut self, effect: SelectionEffect, replacement: Option<Document>) -> FollowUp {
        match effect {
            SelectionEffect::Unchanged => FollowUp::Nothing,
            SelectionEffect::Refreshed(_) => match replacement {
                Some(doc) => {
                    // A rename or a repeated event keeps what the viewer has open.
                    let same_content = self
                        .current
                        .as_ref()
                        .is_some_and(|current| current.root == doc.root);
                    if !same_content {
                        self.view = ViewState::new(&doc.root);
                    }
                    self.current = Some(Arc::new(doc));
                    FollowUp::Rerender
                }
                None => FollowUp::Nothing,
            },
            SelectionEffect::Moved(Some(next)) => {
                self.current = None;
                FollowUp::Open(next)
            }
            SelectionEffect::Moved(None) => {
                self.close();
                FollowUp::ShowEmpty
            }
        }
    }
}
