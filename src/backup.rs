//! Backup export and import format.
//!
//! A backup is a plain JSON array of notes, pretty-printed. Imports accept
//! either that full array (a wholesale restore) or a bare list of
//! title/content pairs (treated as new notes). Unlike the data-model
//! operations, a malformed import is surfaced to the caller: it is an
//! explicit user action where silent failure would be misleading.
use crate::{ImportedNote, Note, NotesError, Result};

/// A parsed backup payload.
#[derive(Debug)]
pub enum BackupImport {
    /// A full note array; replaces the live repository.
    Full(Vec<Note>),
    /// Bare title/content pairs; imported as new notes.
    Pairs(Vec<ImportedNote>),
}

/// Serializes the live notes as a pretty-printed JSON array.
pub fn export_notes(notes: &[Note]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&notes)?)
}

/// Parses backup data, trying the full note array first and falling back
/// to title/content pairs.
pub fn parse_backup(data: &str) -> Result<BackupImport> {
    if let Ok(notes) = serde_json::from_str::<Vec<Note>>(data) {
        return Ok(BackupImport::Full(notes));
    }
    if let Ok(pairs) = serde_json::from_str::<Vec<ImportedNote>>(data) {
        return Ok(BackupImport::Pairs(pairs));
    }
    Err(NotesError::ImportFailed {
        message: "not a note array or a title/content list".to_string(),
    })
}
