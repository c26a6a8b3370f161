//! crates/document_viewer_core/src/wire.rs
//!
//! Normalizes the processing service's JSON into `ContentNode` trees and
//! writes them back out in the same shape.
//!
//! The service output is unvalidated: field names vary between releases and
//! values are not always strings. Everything is coerced here so that the rest
//! of the crate only ever sees typed content.

use crate::domain::{ContentMap, ContentNode, Localized};
use serde::Serialize;
use serde_json::{Map, Value};

const TEXT_DEFAULT: &[&str] = &["text"];
const TEXT_HINDI: &[&str] = &["hindi_text"];
const TEXT_GUJARATI: &[&str] = &["guj_text"];
const AUDIO_DEFAULT: &[&str] = &["eng_speech_url", "en_speech_url"];
const AUDIO_HINDI: &[&str] = &["hindi_speech_url", "hi_speech_url"];
const AUDIO_GUJARATI: &[&str] = &["guj_speech_url", "gu_speech_url"];
const CHILDREN: &[&str] = &["subtopics", "children"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("document content must be a JSON object")]
    RootNotObject,
    #[error("content node '{0}' must be a JSON object")]
    NodeNotObject(String),
}

/// Parses a root content mapping, rejecting anything that is not an object of
/// objects. Key order is preserved.
pub fn parse_content(value: &Value) -> Result<ContentMap, ContentError> {
    let object = value.as_object().ok_or(ContentError::RootNotObject)?;
    parse_children(object, "")
}

fn parse_children(object: &Map<String, Value>, parent: &str) -> Result<ContentMap, ContentError> {
    let mut children = ContentMap::with_capacity(object.len());
    for (key, value) in object {
        let path = if parent.is_empty() {
            key.clone()
        } else {
            format!("{parent}/{key}")
        };
        let node = value
            .as_object()
            .ok_or_else(|| ContentError::NodeNotObject(path.clone()))?;
        children.insert(key.clone(), parse_node(node, &path)?);
    }
    Ok(children)
}

fn parse_node(object: &Map<String, Value>, path: &str) -> Result<ContentNode, ContentError> {
    let children = match first_object(object, CHILDREN) {
        Some(nested) => parse_children(nested, path)?,
        None => ContentMap::new(),
    };

    Ok(ContentNode {
        text: Localized {
            default: string_field(object, TEXT_DEFAULT),
            hindi: string_field(object, TEXT_HINDI),
            gujarati: string_field(object, TEXT_GUJARATI),
        },
        audio_url: Localized {
            default: string_field(object, AUDIO_DEFAULT),
            hindi: string_field(object, AUDIO_HINDI),
            gujarati: string_field(object, AUDIO_GUJARATI),
        },
        children,
    })
}

/// First object among `names`; a null or scalar alias does not hide the next.
fn first_object<'a>(
    object: &'a Map<String, Value>,
    names: &[&str],
) -> Option<&'a Map<String, Value>> {
    names
        .iter()
        .find_map(|name| object.get(*name).and_then(Value::as_object))
}

/// First non-empty string among `names`; other value types count as absent.
fn string_field(object: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .filter_map(|name| object.get(*name).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .map(str::to_string)
}

impl TryFrom<Value> for ContentNode {
    type Error = ContentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let object = value
            .as_object()
            .ok_or_else(|| ContentError::NodeNotObject(String::new()))?;
        parse_node(object, "")
    }
}

//=========================================================================================
// Outbound Shape
//=========================================================================================

/// The processing service's node layout, used when writing content back out.
#[derive(Debug, Serialize)]
pub struct WireNode {
    text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    hindi_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    guj_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    eng_speech_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hindi_speech_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    guj_speech_url: Option<String>,
    subtopics: ContentMap,
}

impl From<ContentNode> for WireNode {
    fn from(node: ContentNode) -> Self {
        Self {
            text: node.text.default.unwrap_or_default(),
            hindi_text: node.text.hindi,
            guj_text: node.text.gujarati,
            eng_speech_url: node.audio_url.default,
            hindi_speech_url: node.audio_url.hindi,
            guj_speech_url: node.audio_url.gujarati,
            subtopics: node.children,
        }
    }
}

/// Serializes a root mapping in the wire layout, ready for storage.
pub fn content_to_value(root: &ContentMap) -> Value {
    // Serializing strings and maps with string keys cannot fail.
    serde_json::to_value(root).unwrap_or(Value::Object(Map::new()))
}
