//! crates/document_viewer_core/src/tree.rs
//!
//! Traversal functions over content trees: display ordering, localized
//! lookups and the outline handed to clients. Nothing here mutates its input.

use crate::domain::{ContentMap, ContentNode, Language};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

fn prefix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\d+(?:\.\d+)*").expect("static pattern is valid"))
}

/// Sort key derived from a node key. Numbered keys sort before unnumbered ones;
/// numbers compare segment by segment, so `2.2` comes before `2.10`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum OrderKey {
    Numbered(Vec<u64>),
    Unnumbered,
}

/// Parses the leading numeric prefix of a key, e.g. `[2, 1]` for
/// `"2.1 Before Commencement:"`. A prefix with a segment too large to
/// represent counts as no prefix.
pub fn numeric_prefix(key: &str) -> Option<Vec<u64>> {
    let token = prefix_pattern().find(key)?.as_str();
    token.split('.').map(|seg| seg.parse::<u64>().ok()).collect()
}

pub fn order_key(key: &str) -> OrderKey {
    numeric_prefix(key).map_or(OrderKey::Unnumbered, OrderKey::Numbered)
}

/// Returns the entries of `map` in display order. The sort is stable, so
/// equal prefixes and unnumbered keys keep their encounter order.
pub fn ordered_entries(map: &ContentMap) -> Vec<(&str, &ContentNode)> {
    let mut entries: Vec<_> = map
        .iter()
        .map(|(key, node)| (order_key(key), key.as_str(), node))
        .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    entries.into_iter().map(|(_, key, node)| (key, node)).collect()
}

/// The prefix token as written in the key (`"2."`, `"2.1"`), if any.
pub fn number_label(key: &str) -> Option<&str> {
    numeric_prefix(key)?;
    let token = prefix_pattern().find(key)?.as_str();
    let rest = &key[token.len()..];
    Some(if rest.starts_with('.') { &key[..token.len() + 1] } else { token })
}

/// The key with its numeric prefix removed, for use as a heading.
pub fn display_title(key: &str) -> &str {
    match number_label(key) {
        Some(label) => key[label.len()..].trim(),
        None => key.trim(),
    }
}

/// Localized description text, falling back to the default language.
/// Empty means there is no description panel to show.
pub fn resolve_text(node: &ContentNode, language: Language) -> &str {
    node.text
        .get(language)
        .or_else(|| node.text.get(Language::Default))
        .unwrap_or("")
}

/// Localized narration URL. Deliberately has no fallback: a missing localized
/// asset means no player for that language.
pub fn resolve_audio(node: &ContentNode, language: Language) -> Option<&str> {
    node.audio_url.get(language)
}

pub fn has_content(node: &ContentNode) -> bool {
    !node.text.is_empty()
}

pub fn has_children(node: &ContentNode) -> bool {
    !node.children.is_empty()
}

/// Finds a node by key anywhere in the tree, searching depth-first in
/// display order.
pub fn find_node<'a>(map: &'a ContentMap, key: &str) -> Option<&'a ContentNode> {
    if let Some(node) = map.get(key) {
        return Some(node);
    }
    ordered_entries(map)
        .into_iter()
        .find_map(|(_, node)| find_node(&node.children, key))
}

/// The first section in display order.
pub fn first_entry_key(map: &ContentMap) -> Option<&str> {
    ordered_entries(map).first().map(|(key, _)| *key)
}

//=========================================================================================
// Outline
//=========================================================================================

/// A node resolved for one language and ready to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlineEntry {
    pub key: String,
    pub number: Option<String>,
    pub title: String,
    pub text: Option<String>,
    pub audio_url: Option<String>,
    pub has_content: bool,
    pub children: Vec<OutlineEntry>,
}

/// Builds the ordered outline of a content tree for `language`, at any depth.
pub fn build_outline(map: &ContentMap, language: Language) -> Vec<OutlineEntry> {
    ordered_entries(map)
        .into_iter()
        .map(|(key, node)| {
            let text = resolve_text(node, language);
            OutlineEntry {
                key: key.to_string(),
                number: number_label(key).map(str::to_string),
                title: display_title(key).to_string(),
                text: (!text.is_empty()).then(|| text.to_string()),
                audio_url: resolve_audio(node, language).map(str::to_string),
                has_content: has_content(node),
                children: build_outline(&node.children, language),
            }
        })
        .collect()
}
