//! The live note collection.
//!
//! `NoteRepository` is the sole owner and sole writer of the non-deleted
//! note set. All operations are total: addressing an unknown id is a silent
//! no-op, never an error. The collection is ordered most-recent-first; new
//! notes are inserted at the head.
use chrono::Utc;

use crate::{generate_id, ImportedNote, Note, NoteUpdate};

/// Placeholder title for notes created without one.
pub const DEFAULT_NOTE_TITLE: &str = "Untitled";

/// Skeleton content for freshly created notes.
pub const DEFAULT_NOTE_CONTENT: &str = "# New note\n\nStart writing...";

/// Authoritative CRUD over the live note set, with tag and pin bookkeeping
/// and an active-selection cursor.
#[derive(Debug, Default)]
pub struct NoteRepository {
    notes: Vec<Note>,
    current_id: Option<String>,
}

impl NoteRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a repository from previously persisted notes, selecting the
    /// first note when there is one.
    pub fn from_notes(notes: Vec<Note>) -> Self {
        let current_id = notes.first().map(|note| note.id.clone());
        NoteRepository { notes, current_id }
    }

    /// The live notes, most recent first.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    /// The currently selected note. A dangling selection reads as `None`.
    pub fn current(&self) -> Option<&Note> {
        self.current_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current_id.as_deref()
    }

    /// Every distinct tag across the live set, in first-seen order.
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for note in &self.notes {
            for tag in &note.tags {
                if !tags.contains(tag) {
                    tags.push(tag.clone());
                }
            }
        }
        tags
    }

    /// Creates a note with placeholder title and skeleton content, inserts
    /// it at the head of the collection, and selects it. `initial_tags`
    /// carries the active tag filter, so a note created while a tag is
    /// selected stays visible in that view.
    pub fn create(&mut self, initial_tags: Vec<String>) -> &Note {
        self.create_from_template(
            DEFAULT_NOTE_TITLE.to_string(),
            DEFAULT_NOTE_CONTENT.to_string(),
            initial_tags,
        )
    }

    /// Like [`create`](Self::create), with caller-supplied title and content.
    pub fn create_from_template(
        &mut self,
        title: String,
        content: String,
        initial_tags: Vec<String>,
    ) -> &Note {
        let note = Note::new(title, content, initial_tags);
        self.current_id = Some(note.id.clone());
        self.notes.insert(0, note);
        &self.notes[0]
    }

    /// Merges the provided fields into the matching note and bumps
    /// `updated_at`. Silently dropped when `id` is unknown.
    pub fn update(&mut self, id: &str, update: NoteUpdate) {
        if let Some(note) = self.notes.iter_mut().find(|note| note.id == id) {
            if let Some(title) = update.title {
                note.title = title;
            }
            if let Some(content) = update.content {
                note.content = content;
            }
            if let Some(tags) = update.tags {
                note.tags = tags;
            }
            note.updated_at = Utc::now();
        }
    }

    /// Flips the pinned state and bumps `updated_at`.
    pub fn toggle_pin(&mut self, id: &str) {
        if let Some(note) = self.notes.iter_mut().find(|note| note.id == id) {
            note.is_pinned = !note.is_pinned;
            note.updated_at = Utc::now();
        }
    }

    /// Appends `tag` to the note's tag set. Adding a tag the note already
    /// carries changes nothing, not even `updated_at`.
    pub fn add_tag(&mut self, id: &str, tag: &str) {
        if let Some(note) = self.notes.iter_mut().find(|note| note.id == id) {
            if !note.tags.iter().any(|t| t == tag) {
                note.tags.push(tag.to_string());
                note.updated_at = Utc::now();
            }
        }
    }

    /// Removes `tag` from the note's tag set. Removing an absent tag is a
    /// no-op, `updated_at` included.
    pub fn remove_tag(&mut self, id: &str, tag: &str) {
        if let Some(note) = self.notes.iter_mut().find(|note| note.id == id) {
            let before = note.tags.len();
            note.tags.retain(|t| t != tag);
            if note.tags.len() != before {
                note.updated_at = Utc::now();
            }
        }
    }

    /// Removes the note from the live collection and returns it. Does not
    /// touch the trash; the caller is responsible for trashing the note
    /// first when the removal is a soft delete. A removed selection falls to
    /// the first remaining note, or to none.
    pub fn remove(&mut self, id: &str) -> Option<Note> {
        let index = self.notes.iter().position(|note| note.id == id)?;
        let removed = self.notes.remove(index);
        if self.current_id.as_deref() == Some(id) {
            self.current_id = self.notes.first().map(|note| note.id.clone());
        }
        Some(removed)
    }

    /// Sets the active note id. The id is not validated; consumers treat a
    /// dangling selection as "no current note".
    pub fn select(&mut self, id: &str) {
        self.current_id = Some(id.to_string());
    }

    /// Re-inserts a note (e.g. one restored from the trash) at the head of
    /// the collection, preserving its id and timestamps, and selects it.
    pub fn insert_at_head(&mut self, note: Note) {
        self.current_id = Some(note.id.clone());
        self.notes.insert(0, note);
    }

    /// Bulk-creates notes from title/content pairs: fresh ids, a shared
    /// batch timestamp, empty tags, unpinned. The batch is prepended in
    /// order and the first imported note becomes the selection.
    pub fn import_many(&mut self, entries: Vec<ImportedNote>) -> usize {
        if entries.is_empty() {
            return 0;
        }
        let now = Utc::now();
        let mut imported: Vec<Note> = entries
            .into_iter()
            .map(|entry| Note {
                id: generate_id(),
                title: entry.title,
                content: entry.content,
                tags: Vec::new(),
                is_pinned: false,
                created_at: now,
                updated_at: now,
            })
            .collect();
        let count = imported.len();
        self.current_id = Some(imported[0].id.clone());
        imported.append(&mut self.notes);
        self.notes = imported;
        count
    }

    /// Wholesale replacement of the live collection, selecting the first
    /// note if any. Used by backup restore.
    pub fn replace_all(&mut self, notes: Vec<Note>) {
        self.current_id = notes.first().map(|note| note.id.clone());
        self.notes = notes;
    }
}
