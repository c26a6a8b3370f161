//! crates/document_viewer_core/src/expansion.rs
//!
//! Expand/collapse state of one document's sections, subtopics and
//! description panels for the current viewing session.

use crate::domain::ContentMap;
use crate::tree::first_entry_key;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionState {
    Collapsed,
    Expanded,
}

impl ExpansionState {
    fn from_open(open: bool) -> Self {
        if open {
            ExpansionState::Expanded
        } else {
            ExpansionState::Collapsed
        }
    }
}

/// Which parts of a document are open.
///
/// The first section in document order starts expanded and stays that way:
/// toggling it re-asserts `Expanded`. Every other section toggles. Under each
/// parent at most one subtopic is active at a time.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewState {
    pinned_section: Option<String>,
    expanded_sections: HashSet<String>,
    active_subtopics: HashMap<String, String>,
    open_descriptions: HashSet<String>,
}

impl ViewState {
    /// The initial state for a document: only the first section is open, with
    /// its description panel shown.
    pub fn new(root: &ContentMap) -> Self {
        let mut state = Self::default();
        if let Some(first) = first_entry_key(root) {
            state.pinned_section = Some(first.to_string());
            state.expanded_sections.insert(first.to_string());
            state.open_descriptions.insert(first.to_string());
        }
        state
    }

    pub fn pinned_section(&self) -> Option<&str> {
        self.pinned_section.as_deref()
    }

    pub fn section_state(&self, key: &str) -> ExpansionState {
        ExpansionState::from_open(self.expanded_sections.contains(key))
    }

    pub fn toggle_section(&mut self, key: &str) -> ExpansionState {
        if self.pinned_section.as_deref() == Some(key) || !self.expanded_sections.contains(key) {
            self.expanded_sections.insert(key.to_string());
            ExpansionState::Expanded
        } else {
            self.expanded_sections.remove(key);
            ExpansionState::Collapsed
        }
    }

    pub fn expand_section(&mut self, key: &str) -> ExpansionState {
        self.expanded_sections.insert(key.to_string());
        ExpansionState::Expanded
    }

    /// Activates `subtopic` under `parent`, replacing whichever subtopic was
    /// active there. Selecting the active subtopic again collapses it.
    pub fn select_subtopic(&mut self, parent: &str, subtopic: &str) -> ExpansionState {
        if self.active_subtopics.get(parent).map(String::as_str) == Some(subtopic) {
            self.active_subtopics.remove(parent);
            ExpansionState::Collapsed
        } else {
            self.active_subtopics
                .insert(parent.to_string(), subtopic.to_string());
            ExpansionState::Expanded
        }
    }

    pub fn active_subtopic(&self, parent: &str) -> Option<&str> {
        self.active_subtopics.get(parent).map(String::as_str)
    }

    pub fn subtopic_state(&self, parent: &str, subtopic: &str) -> ExpansionState {
        ExpansionState::from_open(self.active_subtopic(parent) == Some(subtopic))
    }

    /// Flips a node's description panel and returns whether it is now open.
    pub fn toggle_description(&mut self, key: &str) -> bool {
        if self.open_descriptions.remove(key) {
            false
        } else {
            self.open_descriptions.insert(key.to_string());
            true
        }
    }

    pub fn description_open(&self, key: &str) -> bool {
        self.open_descriptions.contains(key)
    }
}
