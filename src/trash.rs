//! Soft-delete holding area with time-based expiry.
use chrono::{DateTime, Duration, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::Note;

/// A note sitting in the trash, wrapped with its deletion time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashedNote {
    #[serde(flatten)]
    pub note: Note,
    /// When the note was soft-deleted
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub deleted_at: DateTime<Utc>,
}

impl TrashedNote {
    /// The moment this entry falls out of retention.
    pub fn expires_at(&self, retention: Duration) -> DateTime<Utc> {
        self.deleted_at + retention
    }
}

/// Time-bounded soft-delete holding area. Expiry is lazy: expired entries
/// are dropped when the trash is loaded or swept, never by a background
/// timer.
#[derive(Debug)]
pub struct TrashManager {
    entries: Vec<TrashedNote>,
    retention: Duration,
}

impl TrashManager {
    pub fn new(retention_days: i64) -> Self {
        TrashManager {
            entries: Vec::new(),
            retention: Duration::days(retention_days),
        }
    }

    /// Builds the trash from persisted entries, dropping anything already
    /// past retention.
    pub fn load(entries: Vec<TrashedNote>, retention_days: i64) -> Self {
        let mut manager = TrashManager {
            entries,
            retention: Duration::days(retention_days),
        };
        manager.sweep();
        manager
    }

    /// Trashed notes, most recently deleted first.
    pub fn entries(&self) -> &[TrashedNote] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops entries older than the retention window. Returns how many were
    /// removed.
    pub fn sweep(&mut self) -> usize {
        let cutoff = Utc::now() - self.retention;
        let before = self.entries.len();
        self.entries.retain(|entry| entry.deleted_at > cutoff);
        let dropped = before - self.entries.len();
        if dropped > 0 {
            debug!("Swept {} expired note(s) from trash", dropped);
        }
        dropped
    }

    /// Wraps the note with the current time and prepends it to the trash.
    pub fn move_to_trash(&mut self, note: Note) {
        self.entries.insert(
            0,
            TrashedNote {
                note,
                deleted_at: Utc::now(),
            },
        );
    }

    /// Strips the deletion wrapper and hands the bare note back for
    /// re-insertion by the caller. Returns `None` for an unknown id.
    pub fn restore(&mut self, id: &str) -> Option<Note> {
        let index = self.entries.iter().position(|entry| entry.note.id == id)?;
        Some(self.entries.remove(index).note)
    }

    /// Unconditionally removes the entry. Returns whether one was present.
    pub fn purge(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.note.id != id);
        self.entries.len() != before
    }

    /// Empties the trash.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str) -> Note {
        let mut note = Note::new("title".into(), "content".into(), vec!["tag".into()]);
        note.id = id.to_string();
        note
    }

    #[test]
    fn restore_round_trips_the_original_note() {
        let mut trash = TrashManager::new(30);
        let note = sample("a");
        trash.move_to_trash(note.clone());
        assert_eq!(trash.len(), 1);

        let restored = trash.restore("a").unwrap();
        assert_eq!(restored, note);
        assert!(trash.is_empty());
        assert!(trash.restore("a").is_none());
    }

    #[test]
    fn restore_unknown_id_returns_none() {
        let mut trash = TrashManager::new(30);
        trash.move_to_trash(sample("a"));
        assert!(trash.restore("b").is_none());
        assert_eq!(trash.len(), 1);
    }

    #[test]
    fn newest_deletion_sits_at_the_head() {
        let mut trash = TrashManager::new(30);
        trash.move_to_trash(sample("a"));
        trash.move_to_trash(sample("b"));
        assert_eq!(trash.entries()[0].note.id, "b");
        assert_eq!(trash.entries()[1].note.id, "a");
    }

    #[test]
    fn purge_and_clear() {
        let mut trash = TrashManager::new(30);
        trash.move_to_trash(sample("a"));
        trash.move_to_trash(sample("b"));
        assert!(trash.purge("a"));
        assert!(!trash.purge("a"));
        assert_eq!(trash.len(), 1);
        trash.clear();
        assert!(trash.is_empty());
    }

    #[test]
    fn load_drops_entries_past_retention() {
        let fresh = TrashedNote {
            note: sample("fresh"),
            deleted_at: Utc::now() - Duration::days(1),
        };
        let expired = TrashedNote {
            note: sample("old"),
            deleted_at: Utc::now() - Duration::days(31),
        };
        let trash = TrashManager::load(vec![fresh, expired], 30);
        assert_eq!(trash.len(), 1);
        assert_eq!(trash.entries()[0].note.id, "fresh");
    }

    #[test]
    fn sweep_reports_dropped_count() {
        // With a zero-day retention every existing entry is already expired.
        let mut trash = TrashManager::new(0);
        trash.move_to_trash(sample("a"));
        trash.move_to_trash(sample("b"));
        assert_eq!(trash.sweep(), 2);
        assert_eq!(trash.sweep(), 0);
        assert!(trash.is_empty());
    }

    #[test]
    fn trashed_note_serializes_flat_with_deleted_at() {
        let entry = TrashedNote {
            note: sample("a"),
            deleted_at: Utc::now(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"deletedAt\""));
        assert!(json.contains("\"isPinned\""));
        let back: TrashedNote = serde_json::from_str(&json).unwrap();
        assert_eq!(back.note.id, "a");
    }
}
