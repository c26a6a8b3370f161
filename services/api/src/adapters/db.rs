//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DocumentStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`, including the LISTEN/NOTIFY
//! change feed.

use crate::adapters::change_feed::ChangeFeed;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use document_viewer_core::domain::{
    ChangeEvent, ContentMap, Document, DocumentId, DocumentSummary,
};
use document_viewer_core::ports::{ChangeStream, DocumentStore, PortError, PortResult};
use document_viewer_core::wire::{content_to_value, parse_content};
use serde::Deserialize;
use sqlx::postgres::PgListener;
use sqlx::{FromRow, PgPool};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// The channel the `documents` trigger notifies on.
pub const CHANGE_CHANNEL: &str = "document_changes";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DocumentStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
    feed: ChangeFeed,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            feed: ChangeFeed::default(),
        }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Starts forwarding row notifications from PostgreSQL to subscribers.
    ///
    /// Changes made by any connection, including other service instances,
    /// reach every subscriber of this adapter.
    pub async fn start_change_listener(&self) -> Result<JoinHandle<()>, sqlx::Error> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        info!("Listening for document changes on '{}'", CHANGE_CHANNEL);

        let adapter = self.clone();
        Ok(tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => adapter.forward(notification.payload()).await,
                    Err(e) => {
                        error!("Change listener error: {:?}", e);
                        tokio::time::sleep(Duration::from_secs(1)).await;
                    }
                }
            }
        }))
    }

    async fn forward(&self, payload: &str) {
        let notice: ChangeNotice = match serde_json::from_str(payload) {
            Ok(notice) => notice,
            Err(e) => {
                warn!("Ignoring malformed change notification '{}': {}", payload, e);
                return;
            }
        };
        debug!("Document change: {} {}", notice.op, notice.id);

        let event = match notice.op.as_str() {
            "DELETE" => ChangeEvent::Deleted { id: notice.id },
            op @ ("INSERT" | "UPDATE") => match self.get_document(notice.id).await {
                Ok(doc) if op == "INSERT" => ChangeEvent::Inserted(doc),
                Ok(doc) => ChangeEvent::Updated(doc),
                // Deleted again before we could read it; the DELETE notice follows.
                Err(PortError::NotFound(_)) => return,
                Err(e) => {
                    error!("Failed to load changed document {}: {:?}", notice.id, e);
                    return;
                }
            },
            other => {
                warn!("Ignoring unknown change operation '{}'", other);
                return;
            }
        };
        self.feed.publish(event);
    }
}

#[derive(Deserialize)]
struct ChangeNotice {
    op: String,
    id: Uuid,
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct DocumentRecord {
    id: Uuid,
    name: String,
    /// The `content` column read back as text, keys in stored order.
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl DocumentRecord {
    fn to_domain(self) -> PortResult<Document> {
        let invalid = |e: &dyn std::fmt::Display| {
            PortError::Persistence(format!("Stored content of document {} is invalid: {}", self.id, e))
        };
        let value: serde_json::Value =
            serde_json::from_str(&self.content).map_err(|e| invalid(&e))?;
        let root = parse_content(&value).map_err(|e| invalid(&e))?;
        Ok(Document {
            id: self.id,
            name: self.name,
            root,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct SummaryRecord {
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl SummaryRecord {
    fn to_domain(self) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Serializes content for the `content` column. The text is bound as-is and
/// cast to `json`, which keeps key order; `jsonb` would re-sort the keys.
fn encode_content(root: &ContentMap) -> PortResult<String> {
    serde_json::to_string(&content_to_value(root))
        .map_err(|e| PortError::Persistence(format!("Failed to encode content: {}", e)))
}

const DOCUMENT_COLUMNS: &str = "id, name, content::text AS content, created_at, updated_at";

fn not_found_or_persistence(id: DocumentId) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("Document {} not found", id)),
        _ => PortError::Persistence(e.to_string()),
    }
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for DbAdapter {
    async fn list_documents(&self) -> PortResult<Vec<DocumentSummary>> {
        let records = sqlx::query_as::<_, SummaryRecord>(
            "SELECT id, name, created_at, updated_at FROM documents ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn create_document(&self, name: &str, root: &ContentMap) -> PortResult<DocumentId> {
        let id = sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO documents (id, name, content) VALUES ($1, $2, $3::json) RETURNING id",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(encode_content(root)?)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Persistence(e.to_string()))?;
        Ok(id)
    }

    async fn get_document(&self, id: DocumentId) -> PortResult<Document> {
        let record = sqlx::query_as::<_, DocumentRecord>(&format!(
            "SELECT {} FROM documents WHERE id = $1",
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_persistence(id))?;
        record.to_domain()
    }

    async fn replace_document(
        &self,
        id: DocumentId,
        name: &str,
        root: &ContentMap,
    ) -> PortResult<Document> {
        let record = sqlx::query_as::<_, DocumentRecord>(&format!(
            "UPDATE documents SET name = $2, content = $3::json, updated_at = now() \
             WHERE id = $1 RETURNING {}",
            DOCUMENT_COLUMNS
        ))
        .bind(id)
        .bind(name)
        .bind(encode_content(root)?)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_persistence(id))?;
        record.to_domain()
    }

    async fn delete_document(&self, id: DocumentId) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Document {} not found", id)));
        }
        Ok(())
    }

    fn subscribe(&self) -> ChangeStream {
        self.feed.subscribe()
    }
}
