//! Bounded per-note version history.
//!
//! Snapshots are append-only: restoring a version never rewrites the log,
//! it only feeds the snapshot's content back through a repository update.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title recorded for snapshots taken without one.
const UNTITLED_VERSION: &str = "untitled";

/// An immutable snapshot of a note's title and content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteVersion {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub content: String,
}

/// Append-only snapshot logs keyed by note id, each capped at a fixed
/// length with oldest-first eviction.
#[derive(Debug)]
pub struct VersionHistory {
    versions: HashMap<String, Vec<NoteVersion>>,
    cap: usize,
}

impl VersionHistory {
    pub fn new(cap: usize) -> Self {
        VersionHistory {
            versions: HashMap::new(),
            cap,
        }
    }

    /// Builds the history from persisted logs.
    pub fn load(versions: HashMap<String, Vec<NoteVersion>>, cap: usize) -> Self {
        VersionHistory { versions, cap }
    }

    /// Appends a snapshot to the note's log, unless it matches the most
    /// recent entry (same content, and same title when one is supplied):
    /// no-op saves must not bloat the log. Returns whether an entry was
    /// appended. Over-cap logs evict their oldest entries.
    pub fn add_version(&mut self, note_id: &str, content: &str, title: Option<&str>) -> bool {
        let log = self.versions.entry(note_id.to_string()).or_default();

        if let Some(latest) = log.last() {
            let same_title = match title {
                Some(t) if !t.is_empty() => latest.title == t,
                _ => true,
            };
            if latest.content == content && same_title {
                return false;
            }
        }

        let title = match title {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => UNTITLED_VERSION.to_string(),
        };
        log.push(NoteVersion {
            timestamp: Utc::now(),
            title,
            content: content.to_string(),
        });
        if log.len() > self.cap {
            let excess = log.len() - self.cap;
            log.drain(..excess);
        }
        true
    }

    /// The note's snapshots in insertion order (oldest first). An unknown
    /// id reads as an empty log.
    pub fn versions(&self, note_id: &str) -> &[NoteVersion] {
        self.versions.get(note_id).map_or(&[], Vec::as_slice)
    }

    /// Deletes the entire log for a note.
    pub fn clear(&mut self, note_id: &str) {
        self.versions.remove(note_id);
    }

    /// All logs, for persistence.
    pub fn snapshot(&self) -> &HashMap<String, Vec<NoteVersion>> {
        &self.versions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_note_reads_as_empty_log() {
        let history = VersionHistory::new(10);
        assert!(history.versions("missing").is_empty());
    }

    #[test]
    fn consecutive_identical_content_is_deduplicated() {
        let mut history = VersionHistory::new(10);
        assert!(history.add_version("n", "same", None));
        assert!(!history.add_version("n", "same", None));
        assert_eq!(history.versions("n").len(), 1);
    }

    #[test]
    fn dedup_considers_title_only_when_supplied() {
        let mut history = VersionHistory::new(10);
        assert!(history.add_version("n", "body", Some("first")));
        // same content, no title supplied: still a duplicate
        assert!(!history.add_version("n", "body", None));
        // same content under a different title is a new version
        assert!(history.add_version("n", "body", Some("second")));
        assert_eq!(history.versions("n").len(), 2);
    }

    #[test]
    fn missing_title_is_recorded_as_untitled() {
        let mut history = VersionHistory::new(10);
        history.add_version("n", "body", None);
        history.add_version("n", "more", Some(""));
        assert_eq!(history.versions("n")[0].title, "untitled");
        assert_eq!(history.versions("n")[1].title, "untitled");
    }

    #[test]
    fn log_is_capped_with_oldest_first_eviction() {
        let mut history = VersionHistory::new(10);
        for i in 0..15 {
            assert!(history.add_version("n", &format!("v{}", i), None));
        }
        let versions = history.versions("n");
        assert_eq!(versions.len(), 10);
        assert_eq!(versions[0].content, "v5");
        assert_eq!(versions[9].content, "v14");
    }

    #[test]
    fn clear_removes_the_whole_log() {
        let mut history = VersionHistory::new(10);
        history.add_version("n", "a", None);
        history.add_version("other", "b", None);
        history.clear("n");
        assert!(history.versions("n").is_empty());
        assert_eq!(history.versions("other").len(), 1);
    }

    #[test]
    fn logs_are_independent_per_note() {
        let mut history = VersionHistory::new(10);
        history.add_version("a", "same", None);
        // dedup only consults the same note's log
        assert!(history.add_version("b", "same", None));
    }
}
