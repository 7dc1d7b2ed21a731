//! Core note data structure.
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a single note in our system
///
/// Serialized field names and timestamp encoding (epoch milliseconds,
/// camelCase) match the on-disk layout, so exported data stays compatible
/// with existing backups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Unique identifier for the note, assigned at creation
    pub id: String,
    /// Note title
    pub title: String,
    /// Note content in Markdown format
    pub content: String,
    /// Tags for organization; no duplicates, insertion order preserved
    #[serde(default)]
    pub tags: Vec<String>,
    /// Pinned notes sort before all others
    #[serde(default)]
    pub is_pinned: bool,
    /// When the note was created
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Last modification time
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Note {
    /// Creates a new note with the given title and content
    pub fn new(title: String, content: String, tags: Vec<String>) -> Self {
        let now = Utc::now();

        Note {
            id: generate_id(),
            title,
            content,
            tags,
            is_pinned: false,
            created_at: now,
            updated_at: now,
        }
    }
}

static ID_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Generates an opaque note id.
///
/// The creation timestamp alone is not unique enough: bulk imports create
/// many notes within the same millisecond, so a process-wide sequence number
/// is mixed in.
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let seq = ID_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("{:x}-{:x}", millis, seq)
}
