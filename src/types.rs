//! Shared types for the mdnotes application.
//!
//! This module contains the supporting types used throughout the
//! application: the crate-wide Result alias, sort criteria, update and
//! import payloads, and the CLI command definitions.
use std::path::PathBuf;

use clap::Subcommand;
use serde::{Deserialize, Serialize};

use crate::NotesError;

/// A specialized Result type for mdnotes operations.
pub type Result<T> = std::result::Result<T, NotesError>;

/// Sort criterion applied to note views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Sort by last modification time
    #[default]
    UpdatedAt,
    /// Sort by creation time
    CreatedAt,
    /// Sort by title (case-insensitive)
    Title,
}

/// Sort direction applied to note views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    /// Most recent / reverse-alphabetical first
    #[default]
    Desc,
}

/// A partial update applied to an existing note.
///
/// Fields left as `None` are untouched; `tags` replaces the whole tag set
/// when present.
#[derive(Debug, Clone, Default)]
pub struct NoteUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl NoteUpdate {
    /// Update carrying only new content.
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Update carrying only a new title.
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// A bare title/content pair accepted by bulk imports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedNote {
    pub title: String,
    pub content: String,
}

/// Available subcommands for the mdnotes application
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    Create {
        /// Title of the note (a placeholder is used when omitted)
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// Content of the note, can be markdown formatted
        #[clap(short, long)]
        content: Option<String>,

        /// Path to a file containing the note's content
        #[clap(short, long)]
        file: Option<PathBuf>,

        /// Tags to associate with the note (comma-separated)
        #[clap(short = 't', long)]
        tags: Option<String>,

        /// Open content in editor before saving
        #[clap(short, long)]
        edit: bool,
    },

    /// View a note by ID
    View {
        /// ID of the note to view
        id: String,

        /// Format output as raw JSON
        #[clap(short, long)]
        json: bool,
    },

    /// List notes with optional filtering
    List {
        /// Filter notes by tag
        #[clap(short, long)]
        tag: Option<String>,

        /// Filter notes by a search string (title, content, or tags)
        #[clap(short, long)]
        query: Option<String>,

        /// Sort criterion
        #[clap(short, long, value_parser = ["updated", "created", "title"], default_value = "updated")]
        sort: String,

        /// Sort ascending instead of descending
        #[clap(long)]
        asc: bool,

        /// Limit the number of notes returned (0 for no limit)
        #[clap(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Search notes by title or content, ranked by relevance
    Search {
        /// Search query text
        query: String,

        /// Limit the number of search results (0 for no limit)
        #[clap(short = 'n', long, default_value_t = 10)]
        limit: usize,

        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Edit an existing note
    Edit {
        /// ID of the note to edit
        id: String,

        /// New title for the note
        #[clap(short = 'T', long)]
        title: Option<String>,

        /// New content for the note
        #[clap(short, long)]
        content: Option<String>,

        /// Path to a file containing the new note content
        #[clap(short, long)]
        file: Option<PathBuf>,

        /// Open content in editor before saving
        #[clap(short, long)]
        edit: bool,

        /// Tags to add (comma-separated)
        #[clap(short = 'a', long)]
        add_tags: Option<String>,

        /// Tags to remove (comma-separated)
        #[clap(short = 'r', long)]
        remove_tags: Option<String>,
    },

    /// Toggle the pinned state of a note
    Pin {
        /// ID of the note to pin or unpin
        id: String,
    },

    /// Move a note to the trash
    Delete {
        /// ID of the note to delete
        id: String,

        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },

    /// Trash operations (list, restore, purge, empty)
    #[clap(subcommand)]
    Trash(TrashCommands),

    /// Version history operations (list, restore, clear)
    #[clap(subcommand)]
    History(HistoryCommands),

    /// Import notes from a backup file
    Import {
        /// Path to the backup file
        file: PathBuf,

        /// Skip confirmation prompt when the import replaces all notes
        #[clap(short, long)]
        force: bool,
    },

    /// Export all notes as JSON
    Export {
        /// Path for the export file (stdout when omitted)
        #[clap(short, long)]
        output: Option<PathBuf>,
    },

    /// Create a timestamped backup of all notes
    Backup,
}

/// Subcommands operating on the trash
#[derive(Subcommand)]
pub enum TrashCommands {
    /// List trashed notes
    List {
        /// Format output as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Restore a note from the trash
    Restore {
        /// ID of the trashed note
        id: String,
    },

    /// Permanently delete a note from the trash
    Purge {
        /// ID of the trashed note
        id: String,
    },

    /// Permanently delete every note in the trash
    Empty {
        /// Skip confirmation prompt
        #[clap(short, long)]
        force: bool,
    },
}

/// Subcommands operating on version history
#[derive(Subcommand)]
pub enum HistoryCommands {
    /// List saved versions of a note (newest first)
    List {
        /// ID of the note
        id: String,
    },

    /// Restore a note's content from a saved version
    Restore {
        /// ID of the note
        id: String,

        /// Version number as shown by `history list` (1 is the newest)
        #[clap(short = 'n', long, default_value_t = 1)]
        version: usize,
    },

    /// Delete the entire version history of a note
    Clear {
        /// ID of the note
        id: String,
    },
}
