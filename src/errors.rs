//! Error types for the mdnotes application.
//!
//! This module defines custom error types that categorize different failures
//! that can occur during note management operations.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the mdnotes application.
#[derive(Error, Debug)]
pub enum NotesError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors related to serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Note was not found when performing an operation.
    #[error("Note not found: {id}")]
    NoteNotFound { id: String },

    /// Malformed backup data handed to an import.
    #[error("Import failed: {message}")]
    ImportFailed { message: String },

    /// Errors related to backup operations.
    #[error("Backup failed: {message}")]
    BackupFailed { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },

    #[error("{message}")]
    EditorError { message: String },
}
