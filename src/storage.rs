//! Durable persistence for the note store.
//!
//! State lives as a small set of JSON documents under the data directory,
//! one file per storage key. Writes go through a temporary file in the same
//! directory and are moved into place atomically, so a crash mid-write can
//! never corrupt the previous state. Loads treat missing or corrupted files
//! as empty: durable storage is a write-behind copy of the in-memory truth,
//! and a broken file must not take the session down with it.
use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::SystemTime,
};

use chrono::Utc;
use log::{debug, error, info, trace, warn};
use serde::{de::DeserializeOwned, Serialize};
use tempfile::NamedTempFile;

use crate::{Config, Note, NoteVersion, NotesError, Result, TrashedNote};

/// Storage key of the live note collection.
pub const NOTES_KEY: &str = "markdown-notes";
/// Storage key of the trash.
pub const TRASH_KEY: &str = "markdown-notes-trash";
/// Storage key of the per-note version logs.
pub const HISTORY_KEY: &str = "note-history";

const BACKUP_PREFIX: &str = "mdnotes_backup_";

/// Durable JSON key-value storage rooted at the configured data directory.
pub struct Storage {
    config: Config,
}

impl Storage {
    /// Creates the storage layer, ensuring the data directory exists.
    pub fn new(config: Config) -> Result<Self> {
        if !config.data_dir.exists() {
            debug!(
                "Data directory does not exist, creating: {}",
                config.data_dir.display()
            );
            fs::create_dir_all(&config.data_dir).map_err(|e| {
                error!("Failed to create data directory: {}", e);
                NotesError::DirectoryError {
                    path: config.data_dir.clone(),
                }
            })?;
        }
        Ok(Storage { config })
    }

    /// File backing a storage key.
    fn key_path(&self, key: &str) -> PathBuf {
        self.config.data_dir.join(format!("{}.json", key))
    }

    pub fn load_notes(&self) -> Vec<Note> {
        self.load_value(NOTES_KEY)
    }

    pub fn save_notes(&self, notes: &[Note]) -> Result<()> {
        self.save_value(NOTES_KEY, &notes)
    }

    pub fn load_trash(&self) -> Vec<TrashedNote> {
        self.load_value(TRASH_KEY)
    }

    pub fn save_trash(&self, entries: &[TrashedNote]) -> Result<()> {
        self.save_value(TRASH_KEY, &entries)
    }

    pub fn load_history(&self) -> HashMap<String, Vec<NoteVersion>> {
        self.load_value(HISTORY_KEY)
    }

    pub fn save_history(&self, history: &HashMap<String, Vec<NoteVersion>>) -> Result<()> {
        self.save_value(HISTORY_KEY, history)
    }

    /// Loads a storage key, treating a missing, unreadable, or corrupted
    /// document as empty.
    fn load_value<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let path = self.key_path(key);
        if !path.exists() {
            trace!("No stored state for key '{}'", key);
            return T::default();
        }

        match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(value) => value,
                Err(e) => {
                    error!(
                        "Corrupted state in {}, starting empty: {}",
                        path.display(),
                        e
                    );
                    T::default()
                }
            },
            Err(e) => {
                error!("Failed to read {}: {}", path.display(), e);
                T::default()
            }
        }
    }

    /// Serializes a value and atomically replaces the key's backing file.
    fn save_value<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.key_path(key);
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        let mut temp_file = NamedTempFile::new_in(dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            NotesError::Io(e)
        })?;

        let json = serde_json::to_string_pretty(value)?;
        temp_file.write_all(json.as_bytes())?;
        temp_file.flush()?;

        temp_file.persist(&path).map_err(|e| {
            error!("Failed to persist {}: {}", path.display(), e.error);
            NotesError::Io(e.error)
        })?;

        trace!("Saved key '{}' to {}", key, path.display());
        Ok(())
    }

    /// Writes a timestamped JSON backup of the live notes into the backup
    /// directory, then rotates old backups out.
    pub fn backup_notes(&self, notes: &[Note]) -> Result<PathBuf> {
        if !self.config.backup_dir.exists() {
            fs::create_dir_all(&self.config.backup_dir).map_err(|e| NotesError::BackupFailed {
                message: e.to_string(),
            })?;
        }

        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let backup_path = self
            .config
            .backup_dir
            .join(format!("{}{}.json", BACKUP_PREFIX, timestamp));

        let json = serde_json::to_string_pretty(&notes)?;
        fs::write(&backup_path, json).map_err(|e| NotesError::BackupFailed {
            message: format!("Failed to write backup {}: {}", backup_path.display(), e),
        })?;

        self.cleanup_old_backups()?;

        info!(
            "Backup of {} note(s) created at {}",
            notes.len(),
            backup_path.display()
        );
        Ok(backup_path)
    }

    /// Removes the oldest backup files once the count exceeds the
    /// configured limit. A limit of 0 keeps everything.
    fn cleanup_old_backups(&self) -> Result<()> {
        if self.config.max_backups == 0 {
            return Ok(());
        }

        let mut backups: Vec<(PathBuf, SystemTime)> = Vec::new();
        for entry in fs::read_dir(&self.config.backup_dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable backup entry: {}", e);
                    continue;
                }
            };
            let path = entry.path();
            let is_backup = path.is_file()
                && path.extension().is_some_and(|ext| ext == "json")
                && path
                    .file_name()
                    .is_some_and(|name| name.to_string_lossy().starts_with(BACKUP_PREFIX));
            if !is_backup {
                continue;
            }
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            backups.push((path, modified));
        }

        if backups.len() <= self.config.max_backups as usize {
            return Ok(());
        }

        // Newest first; everything past the limit goes.
        backups.sort_by(|a, b| b.1.cmp(&a.1));
        for (path, _) in backups.split_off(self.config.max_backups as usize) {
            match fs::remove_file(&path) {
                Ok(_) => debug!("Removed old backup: {}", path.display()),
                Err(e) => warn!("Failed to remove old backup {}: {}", path.display(), e),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(dir: &TempDir) -> Storage {
        let mut config = Config::for_data_dir(dir.path().to_path_buf());
        config.max_backups = 2;
        Storage::new(config).unwrap()
    }

    #[test]
    fn notes_round_trip_through_disk() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let notes = vec![Note::new("a".into(), "b".into(), vec!["t".into()])];
        storage.save_notes(&notes).unwrap();

        let loaded = storage.load_notes();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, notes[0].id);
        assert_eq!(loaded[0].tags, notes[0].tags);
    }

    #[test]
    fn missing_state_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        assert!(storage.load_notes().is_empty());
        assert!(storage.load_trash().is_empty());
        assert!(storage.load_history().is_empty());
    }

    #[test]
    fn corrupted_state_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        fs::write(dir.path().join("markdown-notes.json"), "{{{ not json").unwrap();
        assert!(storage.load_notes().is_empty());
    }

    #[test]
    fn history_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let mut history = HashMap::new();
        history.insert(
            "id".to_string(),
            vec![NoteVersion {
                timestamp: Utc::now(),
                title: "t".to_string(),
                content: "c".to_string(),
            }],
        );
        storage.save_history(&history).unwrap();
        let loaded = storage.load_history();
        assert_eq!(loaded["id"].len(), 1);
        assert_eq!(loaded["id"][0].content, "c");
    }

    #[test]
    fn backups_rotate_beyond_the_limit() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let notes = vec![Note::new("a".into(), "b".into(), vec![])];

        // Same-second backups share a filename, so nudge each one apart.
        for i in 0..4 {
            let path = storage.backup_notes(&notes).unwrap();
            let renamed = path.with_file_name(format!("{}extra_{}.json", BACKUP_PREFIX, i));
            fs::rename(&path, &renamed).unwrap();
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
        storage.backup_notes(&notes).unwrap();

        let count = fs::read_dir(dir.path().join("backups"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(BACKUP_PREFIX))
            .count();
        assert_eq!(count, 2);
    }
}
