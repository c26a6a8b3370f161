//! services/api/src/adapters/memory.rs
//!
//! A process-local implementation of the `DocumentStore` port. Used when no
//! database is configured and by the integration tests.

use crate::adapters::change_feed::ChangeFeed;
use async_trait::async_trait;
use chrono::Utc;
use document_viewer_core::domain::{
    ChangeEvent, ContentMap, Document, DocumentId, DocumentSummary,
};
use document_viewer_core::ports::{ChangeStream, DocumentStore, PortError, PortResult};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// Keeps documents in a map guarded by a lock and publishes every change.
#[derive(Default)]
pub struct InMemoryStore {
    documents: RwLock<HashMap<DocumentId, Document>>,
    feed: ChangeFeed,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> PortResult<std::sync::RwLockReadGuard<'_, HashMap<DocumentId, Document>>> {
        self.documents
            .read()
            .map_err(|_| PortError::Persistence("document map lock poisoned".to_string()))
    }

    fn write(&self) -> PortResult<std::sync::RwLockWriteGuard<'_, HashMap<DocumentId, Document>>> {
        self.documents
            .write()
            .map_err(|_| PortError::Persistence("document map lock poisoned".to_string()))
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn list_documents(&self) -> PortResult<Vec<DocumentSummary>> {
        let mut summaries: Vec<_> = self.read()?.values().map(Document::summary).collect();
        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    async fn create_document(&self, name: &str, root: &ContentMap) -> PortResult<DocumentId> {
        let now = Utc::now();
        let document = Document {
            id: Uuid::new_v4(),
            name: name.to_string(),
            root: root.clone(),
            created_at: now,
            updated_at: now,
        };
        let id = document.id;
        self.write()?.insert(id, document.clone());
        self.feed.publish(ChangeEvent::Inserted(document));
        Ok(id)
    }

    async fn get_document(&self, id: DocumentId) -> PortResult<Document> {
        self.read()?
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Document {} not found", id)))
    }

    async fn replace_document(
        &self,
        id: DocumentId,
        name: &str,
        root: &ContentMap,
    ) -> PortResult<Document> {
        let updated = {
            let mut documents = self.write()?;
            let document = documents
                .get_mut(&id)
                .ok_or_else(|| PortError::NotFound(format!("Document {} not found", id)))?;
            document.name = name.to_string();
            document.root = root.clone();
            document.updated_at = Utc::now();
            document.clone()
        };
        self.feed.publish(ChangeEvent::Updated(updated.clone()));
        Ok(updated)
    }

    async fn delete_document(&self, id: DocumentId) -> PortResult<()> {
        if self.write()?.remove(&id).is_none() {
            return Err(PortError::NotFound(format!("Document {} not found", id)));
        }
        self.feed.publish(ChangeEvent::Deleted { id });
        Ok(())
    }

    fn subscribe(&self) -> ChangeStream {
        self.feed.subscribe()
    }
}
