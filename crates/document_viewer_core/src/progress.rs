//! crates/document_viewer_core/src/progress.rs
//!
//! Listening status derived from audio playback progress. Statuses live only
//! for the viewing session and are never written to the store.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Progress strictly above this percentage starts a node.
pub const IN_PROGRESS_THRESHOLD: f64 = 10.0;
/// Progress at or above this percentage completes a node.
pub const COMPLETED_THRESHOLD: f64 = 95.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListeningStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl ListeningStatus {
    /// The status after observing `percent` of playback. Never moves backwards.
    pub fn advance(self, percent: f64) -> Self {
        let observed = if percent >= COMPLETED_THRESHOLD {
            ListeningStatus::Completed
        } else if percent > IN_PROGRESS_THRESHOLD {
            ListeningStatus::InProgress
        } else {
            ListeningStatus::NotStarted
        };
        self.max(observed)
    }
}

/// Converts a player position into a percentage of the track.
/// Returns `None` while the duration is unknown.
pub fn progress_percent(position_secs: f64, duration_secs: f64) -> Option<f64> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 || !position_secs.is_finite() {
        return None;
    }
    Some((position_secs / duration_secs * 100.0).clamp(0.0, 100.0))
}

/// Listening status per node key. Each key advances on its own; parents and
/// children never influence each other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusBoard {
    statuses: HashMap<String, ListeningStatus>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, key: &str) -> ListeningStatus {
        self.statuses.get(key).copied().unwrap_or_default()
    }

    /// Records a progress observation and returns the new status if it changed.
    pub fn record_progress(&mut self, key: &str, percent: f64) -> Option<ListeningStatus> {
        if percent.is_nan() {
            return None;
        }
        let current = self.status(key);
        let next = current.advance(percent);
        if next == current {
            return None;
        }
        self.statuses.insert(key.to_string(), next);
        Some(next)
    }

    pub fn snapshot(&self) -> HashMap<String, ListeningStatus> {
        self.statuses.clone()
    }
}
