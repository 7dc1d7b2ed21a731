//! Filtered and sorted note views.
//!
//! A `NoteFilter` is pure query state: it owns no notes and never mutates
//! the repository. Every projection is recomputed from the collection it is
//! handed, and callers receive owned copies.
use std::cmp::Ordering;

use crate::{Note, SortKey, SortOrder};

/// Transient query parameters for the visible note list.
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    /// Case-insensitive substring matched against title, content, and tags
    pub search: String,
    /// When set, only notes carrying this tag are visible
    pub selected_tag: Option<String>,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
}

impl NoteFilter {
    /// Whether a note passes the tag filter and the search query.
    pub fn matches(&self, note: &Note) -> bool {
        if let Some(tag) = &self.selected_tag {
            if !note.tags.iter().any(|t| t == tag) {
                return false;
            }
        }

        let query = self.search.trim();
        if query.is_empty() {
            return true;
        }
        let query = query.to_lowercase();
        note.title.to_lowercase().contains(&query)
            || note.content.to_lowercase().contains(&query)
            || note.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }

    /// Computes the visible, sorted note list. Pinned notes sort before
    /// unpinned notes regardless of the chosen key; the sort direction
    /// applies only within each pin partition.
    pub fn project(&self, notes: &[Note]) -> Vec<Note> {
        let mut result: Vec<Note> = notes
            .iter()
            .filter(|note| self.matches(note))
            .cloned()
            .collect();

        result.sort_by(|a, b| match b.is_pinned.cmp(&a.is_pinned) {
            Ordering::Equal => {
                let cmp = match self.sort_key {
                    SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
                    SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                    SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                };
                match self.sort_order {
                    SortOrder::Asc => cmp,
                    SortOrder::Desc => cmp.reverse(),
                }
            }
            pinned => pinned,
        });

        result
    }
}
