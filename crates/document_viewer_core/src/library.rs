//! crates/document_viewer_core/src/library.rs
//!
//! The in-memory document list a viewer keeps, with the current selection.
//! Store change notifications are folded in as idempotent upserts and removes;
//! every update builds the next list and swaps it in whole.

use crate::domain::{ChangeEvent, DocumentId, DocumentSummary};

/// What an update did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionEffect {
    /// The selected document is untouched.
    Unchanged,
    /// The selected document's content was replaced.
    Refreshed(DocumentId),
    /// The selected document went away; the selection moved to this one.
    Moved(Option<DocumentId>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentLibrary {
    documents: Vec<DocumentSummary>,
    selected: Option<DocumentId>,
}

impl DocumentLibrary {
    /// Builds a library from store rows, newest first, with nothing selected.
    pub fn new(mut documents: Vec<DocumentSummary>) -> Self {
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self {
            documents,
            selected: None,
        }
    }

    pub fn documents(&self) -> &[DocumentSummary] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.documents.iter().any(|doc| doc.id == id)
    }

    pub fn selected(&self) -> Option<DocumentId> {
        self.selected
    }

    pub fn newest(&self) -> Option<DocumentId> {
        self.documents.first().map(|doc| doc.id)
    }

    /// Selects `id`; returns false and leaves the selection alone when the
    /// library does not hold it.
    pub fn select(&mut self, id: DocumentId) -> bool {
        if self.contains(id) {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Resolves a shareable link: an explicit id wins, otherwise the most
    /// recently created document.
    pub fn resolve_link(&self, requested: Option<DocumentId>) -> Option<DocumentId> {
        requested.or_else(|| self.newest())
    }

    /// Removes a document. When it was selected, the newest remaining document
    /// becomes selected, or nothing if the library is now empty.
    pub fn remove(&mut self, id: DocumentId) -> SelectionEffect {
        if !self.contains(id) {
            return SelectionEffect::Unchanged;
        }
        let next: Vec<_> = self
            .documents
            .iter()
            .filter(|doc| doc.id != id)
            .cloned()
            .collect();
        self.documents = next;

        if self.selected == Some(id) {
            self.selected = self.newest();
            SelectionEffect::Moved(self.selected)
        } else {
            SelectionEffect::Unchanged
        }
    }

    /// Inserts or replaces a row. New rows are placed by creation time, which
    /// puts a freshly created document at the front.
    pub fn upsert(&mut self, summary: DocumentSummary) -> SelectionEffect {
        let id = summary.id;
        let next = if self.contains(id) {
            self.documents
                .iter()
                .map(|doc| if doc.id == id { summary.clone() } else { doc.clone() })
                .collect()
        } else {
            let at = self
                .documents
                .iter()
                .position(|doc| doc.created_at <= summary.created_at)
                .unwrap_or(self.documents.len());
            let mut next = self.documents.clone();
            next.insert(at, summary);
            next
        };
        self.documents = next;

        if self.selected == Some(id) {
            SelectionEffect::Refreshed(id)
        } else {
            SelectionEffect::Unchanged
        }
    }

    /// Applies a store change notification. Applying the same event twice has
    /// the same effect as applying it once.
    pub fn apply(&mut self, event: &ChangeEvent) -> SelectionEffect {
        match event {
            ChangeEvent::Inserted(doc) | ChangeEvent::Updated(doc) => self.upsert(doc.summary()),
            ChangeEvent::Deleted { id } => self.remove(*id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ContentMap, Document};
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn summary(name: &str, minutes: i64) -> DocumentSummary {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes);
        DocumentSummary {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    fn document(summary: &DocumentSummary) -> Document {
        Document {
            id: summary.id,
            name: summary.name.clone(),
            root: ContentMap::new(),
            created_at: summary.created_at,
            updated_at: summary.updated_at,
        }
    }

    fn names(library: &DocumentLibrary) -> Vec<&str> {
        library.documents().iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn lists_newest_first() {
        let library = DocumentLibrary::new(vec![summary("old", 0), summary("new", 10), summary("mid", 5)]);
        assert_eq!(names(&library), ["new", "mid", "old"]);
    }

    #[test]
    fn deleting_selected_selects_the_remaining_document() {
        let a = summary("a", 0);
        let b = summary("b", 1);
        let mut library = DocumentLibrary::new(vec![a.clone(), b.clone()]);
        assert!(library.select(b.id));

        assert_eq!(library.remove(b.id), SelectionEffect::Moved(Some(a.id)));
        assert_eq!(library.selected(), Some(a.id));

        assert_eq!(library.remove(a.id), SelectionEffect::Moved(None));
        assert_eq!(library.selected(), None);
        assert!(library.is_empty());
    }

    #[test]
    fn deleting_unselected_keeps_selection() {
        let a = summary("a", 0);
        let b = summary("b", 1);
        let mut library = DocumentLibrary::new(vec![a.clone(), b.clone()]);
        library.select(a.id);
        assert_eq!(library.remove(b.id), SelectionEffect::Unchanged);
        assert_eq!(library.selected(), Some(a.id));
    }

    #[test]
    fn deleted_event_for_unknown_document_is_a_no_op() {
        let a = summary("a", 0);
        let mut library = DocumentLibrary::new(vec![a.clone()]);
        library.select(a.id);
        let before = library.clone();
        let effect = library.apply(&ChangeEvent::Deleted { id: Uuid::new_v4() });
        assert_eq!(effect, SelectionEffect::Unchanged);
        assert_eq!(library, before);
    }

    #[test]
    fn inserted_event_prepends_once() {
        let a = summary("a", 0);
        let mut library = DocumentLibrary::new(vec![a]);
        let fresh = summary("fresh", 60);
        let event = ChangeEvent::Inserted(document(&fresh));
        library.apply(&event);
        library.apply(&event);
        assert_eq!(names(&library), ["fresh", "a"]);
    }

    #[test]
    fn updated_event_replaces_by_id() {
        let a = summary("a", 0);
        let b = summary("b", 1);
        let mut library = DocumentLibrary::new(vec![a.clone(), b.clone()]);
        library.select(a.id);

        let mut renamed = document(&a);
        renamed.name = "a renamed".into();
        let effect = library.apply(&ChangeEvent::Updated(renamed));
        assert_eq!(effect, SelectionEffect::Refreshed(a.id));
        assert_eq!(names(&library), ["b", "a renamed"]);
    }

    #[test]
    fn updated_event_for_unknown_document_upserts() {
        let a = summary("a", 10);
        let mut library = DocumentLibrary::new(vec![a]);
        let older = summary("older", 0);
        library.apply(&ChangeEvent::Updated(document(&older)));
        assert_eq!(names(&library), ["a", "older"]);
    }

    #[test]
    fn share_link_prefers_explicit_id_then_newest() {
        let a = summary("a", 0);
        let b = summary("b", 1);
        let library = DocumentLibrary::new(vec![a.clone(), b.clone()]);
        assert_eq!(library.resolve_link(Some(a.id)), Some(a.id));
        assert_eq!(library.resolve_link(None), Some(b.id));
        assert_eq!(DocumentLibrary::default().resolve_link(None), None);
    }

    #[test]
    fn select_rejects_unknown_ids() {
        let mut library = DocumentLibrary::new(vec![summary("a", 0)]);
        assert!(!library.select(Uuid::new_v4()));
        assert_eq!(library.selected(), None);
    }
}
