//! crates/document_viewer_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! Content trees are immutable once attached to a `Document`; every traversal
//! in this crate borrows them.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Store-assigned identifier of a persisted document.
pub type DocumentId = Uuid;

/// Ordered mapping of node key to node. Order is the order the processing
/// service emitted, not the display order (see `tree::ordered_entries`).
pub type ContentMap = IndexMap<String, ContentNode>;

//=========================================================================================
// Languages
//=========================================================================================

/// The languages a document can be narrated and described in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English, the language every node is expected to carry.
    #[default]
    #[serde(alias = "english")]
    Default,
    Hindi,
    Gujarati,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Default, Language::Hindi, Language::Gujarati];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Default => "default",
            Language::Hindi => "hindi",
            Language::Gujarati => "gujarati",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown language '{0}' (expected default, english, hindi or gujarati)")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "default" | "english" | "en" => Ok(Language::Default),
            "hindi" | "hi" => Ok(Language::Hindi),
            "gujarati" | "gu" => Ok(Language::Gujarati),
            _ => Err(UnknownLanguage(s.to_string())),
        }
    }
}

//=========================================================================================
// Localized Fields
//=========================================================================================

/// A value that varies by language. Absent and empty are both stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Localized {
    pub default: Option<String>,
    pub hindi: Option<String>,
    pub gujarati: Option<String>,
}

impl Localized {
    /// Returns the value stored for exactly `language`, without fallback.
    pub fn get(&self, language: Language) -> Option<&str> {
        let value = match language {
            Language::Default => &self.default,
            Language::Hindi => &self.hindi,
            Language::Gujarati => &self.gujarati,
        };
        value.as_deref().filter(|v| !v.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        Language::ALL.iter().all(|lang| self.get(*lang).is_none())
    }
}

//=========================================================================================
// Content Tree
//=========================================================================================

/// One section or subtopic of a processed document.
///
/// The node's key lives in the parent mapping. Serialization goes through the
/// processing service's wire format (see `wire`), so a stored document reads
/// back exactly as it was received.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "serde_json::Value", into = "crate::wire::WireNode")]
pub struct ContentNode {
    pub text: Localized,
    pub audio_url: Localized,
    pub children: ContentMap,
}

//=========================================================================================
// Documents
//=========================================================================================

/// A named, persisted content tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    pub root: ContentMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            id: self.id,
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A document row without its content, as shown in the document list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub id: DocumentId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An out-of-band change to the document store.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    Inserted(Document),
    Updated(Document),
    Deleted { id: DocumentId },
}

impl ChangeEvent {
    pub fn document_id(&self) -> DocumentId {
        match self {
            ChangeEvent::Inserted(doc) | ChangeEvent::Updated(doc) => doc.id,
            ChangeEvent::Deleted { id } => *id,
        }
    }
}

/// A file received from a client, about to be sent for processing.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: bytes::Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_parses_aliases_case_insensitively() {
        assert_eq!("English".parse::<Language>().unwrap(), Language::Default);
        assert_eq!("HINDI".parse::<Language>().unwrap(), Language::Hindi);
        assert_eq!(" gujarati ".parse::<Language>().unwrap(), Language::Gujarati);
        assert!("french".parse::<Language>().is_err());
    }

    #[test]
    fn language_deserializes_english_alias() {
        let lang: Language = serde_json::from_str("\"english\"").unwrap();
        assert_eq!(lang, Language::Default);
        assert_eq!(serde_json::to_string(&Language::Hindi).unwrap(), "\"hindi\"");
    }

    #[test]
    fn localized_get_treats_empty_as_absent() {
        let value = Localized {
            default: Some("hello".into()),
            hindi: Some(String::new()),
            gujarati: None,
        };
        assert_eq!(value.get(Language::Default), Some("hello"));
        assert_eq!(value.get(Language::Hindi), None);
        assert_eq!(value.get(Language::Gujarati), None);
        assert!(!value.is_empty());
        assert!(Localized::default().is_empty());
    }
}
