//! The note store facade.
//!
//! `NoteStore` owns the repository, trash, version history, and query state
//! together with the storage layer, and wires the cross-manager flows: a
//! delete trashes the note before removing it from the repository, a
//! restore re-inserts the trashed note unchanged, a permanent delete also
//! drops the note's version history.
//!
//! Persistence is write-behind: every mutation saves the affected state
//! afterwards, and a failed save is logged and swallowed. For the duration
//! of a session the in-memory collections are the truth, and losing a
//! write must never interrupt the user mid-edit.
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use fuzzy_matcher::{skim::SkimMatcherV2, FuzzyMatcher};
use log::{debug, error, info, warn};

use crate::{
    backup, BackupImport, Config, ImportedNote, Note, NoteFilter, NoteRepository, NoteUpdate,
    NoteVersion, Result, SortKey, SortOrder, Storage, TrashManager, TrashedNote, VersionHistory,
};

/// Owns all note state for a session and persists it under the configured
/// data directory.
pub struct NoteStore {
    config: Config,
    storage: Storage,
    repository: NoteRepository,
    trash: TrashManager,
    history: VersionHistory,
    filter: NoteFilter,
    last_saved: Option<DateTime<Utc>>,
}

impl NoteStore {
    /// Opens the store, loading persisted state. Trash entries past
    /// retention are swept immediately; a sweep that dropped anything is
    /// persisted so expired notes never come back.
    pub fn open(config: Config) -> Result<Self> {
        let storage = Storage::new(config.clone())?;

        let repository = NoteRepository::from_notes(storage.load_notes());
        let trash_entries = storage.load_trash();
        let loaded_count = trash_entries.len();
        let trash = TrashManager::load(trash_entries, config.trash_retention_days);
        let history = VersionHistory::load(storage.load_history(), config.max_versions);

        info!(
            "Opened note store with {} note(s), {} in trash",
            repository.len(),
            trash.len()
        );

        let mut store = NoteStore {
            config,
            storage,
            repository,
            trash,
            history,
            filter: NoteFilter::default(),
            last_saved: None,
        };
        if store.trash.len() != loaded_count {
            store.persist_trash();
        }
        Ok(store)
    }

    // ---- repository operations ----

    /// Creates a note with placeholder title and skeleton content. The
    /// active tag filter, when set, becomes the note's initial tag.
    pub fn create_note(&mut self) -> String {
        let initial_tags: Vec<String> = self.filter.selected_tag.iter().cloned().collect();
        let id = self.repository.create(initial_tags).id.clone();
        debug!("Created note {}", id);
        self.persist_notes();
        id
    }

    /// Creates a note from a template's title and content.
    pub fn create_from_template(&mut self, title: String, content: String) -> String {
        let initial_tags: Vec<String> = self.filter.selected_tag.iter().cloned().collect();
        let id = self
            .repository
            .create_from_template(title, content, initial_tags)
            .id
            .clone();
        debug!("Created note {} from template", id);
        self.persist_notes();
        id
    }

    pub fn update_note(&mut self, id: &str, update: NoteUpdate) {
        self.repository.update(id, update);
        self.persist_notes();
    }

    pub fn toggle_pin(&mut self, id: &str) {
        self.repository.toggle_pin(id);
        self.persist_notes();
    }

    pub fn add_tag(&mut self, id: &str, tag: &str) {
        self.repository.add_tag(id, tag);
        self.persist_notes();
    }

    pub fn remove_tag(&mut self, id: &str, tag: &str) {
        self.repository.remove_tag(id, tag);
        self.persist_notes();
    }

    pub fn select_note(&mut self, id: &str) {
        self.repository.select(id);
    }

    /// Soft-deletes a note: it is handed to the trash first, then removed
    /// from the live collection. Returns whether the note existed.
    pub fn delete_note(&mut self, id: &str) -> bool {
        let note = match self.repository.get(id) {
            Some(note) => note.clone(),
            None => {
                debug!("Delete requested for unknown note {}", id);
                return false;
            }
        };

        info!("Moving note {} to trash", note.id);
        self.trash.move_to_trash(note);
        self.repository.remove(id);
        self.persist_notes();
        self.persist_trash();
        true
    }

    /// Restores a trashed note into the live collection, preserving its id
    /// and timestamps, and selects it. Returns whether the id was found in
    /// the trash.
    pub fn restore_note(&mut self, id: &str) -> bool {
        match self.trash.restore(id) {
            Some(note) => {
                info!("Restored note {} from trash", note.id);
                self.repository.insert_at_head(note);
                self.persist_notes();
                self.persist_trash();
                true
            }
            None => false,
        }
    }

    /// Permanently deletes a trashed note, along with its version history.
    pub fn purge_note(&mut self, id: &str) -> bool {
        let purged = self.trash.purge(id);
        if purged {
            info!("Permanently deleted note {}", id);
            self.history.clear(id);
            self.persist_trash();
            self.persist_history();
        }
        purged
    }

    /// Empties the trash, dropping the version history of every purged
    /// note.
    pub fn empty_trash(&mut self) {
        let ids: Vec<String> = self
            .trash
            .entries()
            .iter()
            .map(|entry| entry.note.id.clone())
            .collect();
        if ids.is_empty() {
            return;
        }
        info!("Emptying trash ({} note(s))", ids.len());
        for id in &ids {
            self.history.clear(id);
        }
        self.trash.clear();
        self.persist_trash();
        self.persist_history();
    }

    /// Bulk-imports title/content pairs as new notes.
    pub fn import_notes(&mut self, entries: Vec<ImportedNote>) -> usize {
        let count = self.repository.import_many(entries);
        if count > 0 {
            info!("Imported {} note(s)", count);
            self.persist_notes();
        }
        count
    }

    /// Replaces the whole live collection, e.g. when restoring a backup.
    /// The previous state is backed up first when auto-backup is on.
    pub fn replace_all(&mut self, notes: Vec<Note>) {
        if self.config.auto_backup && !self.repository.is_empty() {
            if let Err(e) = self.backup_now() {
                warn!("Pre-restore backup failed: {}", e);
            }
        }
        info!("Replacing live collection with {} note(s)", notes.len());
        self.repository.replace_all(notes);
        self.persist_notes();
    }

    // ---- version history ----

    /// Snapshots a note's current title and content into its version log.
    /// Returns false when the note is unknown or the snapshot duplicated
    /// the latest entry.
    pub fn record_version(&mut self, id: &str) -> bool {
        let (note_id, title, content) = match self.repository.get(id) {
            Some(note) => (note.id.clone(), note.title.clone(), note.content.clone()),
            None => return false,
        };
        let added = self.history.add_version(&note_id, &content, Some(&title));
        if added {
            self.persist_history();
        }
        added
    }

    /// Feeds a saved version's content back into the note. The log itself
    /// is untouched: restoring is an ordinary content update.
    pub fn restore_version(&mut self, id: &str, version: &NoteVersion) {
        self.update_note(id, NoteUpdate::content(version.content.clone()));
    }

    pub fn versions(&self, id: &str) -> &[NoteVersion] {
        self.history.versions(id)
    }

    pub fn clear_history(&mut self, id: &str) {
        self.history.clear(id);
        self.persist_history();
    }

    // ---- views ----

    /// The visible note list under the current filter and sort settings.
    pub fn visible_notes(&self) -> Vec<Note> {
        self.filter.project(self.repository.notes())
    }

    pub fn all_notes(&self) -> &[Note] {
        self.repository.notes()
    }

    pub fn get_note(&self, id: &str) -> Option<&Note> {
        self.repository.get(id)
    }

    pub fn current_note(&self) -> Option<&Note> {
        self.repository.current()
    }

    pub fn all_tags(&self) -> Vec<String> {
        self.repository.all_tags()
    }

    /// The trash, swept of expired entries first. A sweep that dropped
    /// anything is persisted.
    pub fn trashed_notes(&mut self) -> &[TrashedNote] {
        if self.trash.sweep() > 0 {
            self.persist_trash();
        }
        self.trash.entries()
    }

    /// Searches notes with fuzzy matching, best match first. Title matches
    /// weigh double. This is a convenience for pick-a-note flows; the
    /// visible list itself uses plain substring filtering.
    pub fn search_ranked(&self, query: &str) -> Vec<Note> {
        let matcher = SkimMatcherV2::default();
        let mut matched: Vec<(i64, &Note)> = Vec::new();

        for note in self.repository.notes() {
            let title_score = matcher.fuzzy_match(&note.title, query).unwrap_or(0);
            let content_score = matcher.fuzzy_match(&note.content, query).unwrap_or(0);
            let score = title_score * 2 + content_score;
            if score > 0 {
                matched.push((score, note));
            }
        }

        matched.sort_by(|a, b| b.0.cmp(&a.0));
        matched.into_iter().map(|(_, note)| note.clone()).collect()
    }

    // ---- query state ----

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.filter.search = query.into();
    }

    pub fn set_tag_filter(&mut self, tag: Option<String>) {
        self.filter.selected_tag = tag;
    }

    pub fn set_sort(&mut self, key: SortKey, order: SortOrder) {
        self.filter.sort_key = key;
        self.filter.sort_order = order;
    }

    pub fn filter(&self) -> &NoteFilter {
        &self.filter
    }

    /// When the last successful notes save happened, if any.
    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ---- backup ----

    /// Exports the live notes as a JSON array.
    pub fn export_json(&self) -> Result<String> {
        backup::export_notes(self.repository.notes())
    }

    /// Applies parsed backup data: a full array replaces the collection, a
    /// pair list imports as new notes. Returns how many notes were applied.
    pub fn restore_backup(&mut self, data: &str) -> Result<usize> {
        match backup::parse_backup(data)? {
            BackupImport::Full(notes) => {
                let count = notes.len();
                self.replace_all(notes);
                Ok(count)
            }
            BackupImport::Pairs(pairs) => Ok(self.import_notes(pairs)),
        }
    }

    /// Writes a timestamped backup of the live notes, rotating old ones.
    pub fn backup_now(&self) -> Result<PathBuf> {
        self.storage.backup_notes(self.repository.notes())
    }

    // ---- persistence (write-behind, best-effort) ----

    fn persist_notes(&mut self) {
        match self.storage.save_notes(self.repository.notes()) {
            Ok(()) => self.last_saved = Some(Utc::now()),
            Err(e) => error!("Failed to persist notes: {}", e),
        }
    }

    fn persist_trash(&self) {
        if let Err(e) = self.storage.save_trash(self.trash.entries()) {
            error!("Failed to persist trash: {}", e);
        }
    }

    fn persist_history(&self) {
        if let Err(e) = self.storage.save_history(self.history.snapshot()) {
            error!("Failed to persist history: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> NoteStore {
        let mut config = Config::for_data_dir(dir.path().to_path_buf());
        config.auto_backup = false;
        NoteStore::open(config).unwrap()
    }

    #[test]
    fn create_update_pin_delete_restore_scenario() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);

        let a = store.create_note();
        store.update_note(&a, NoteUpdate::content("# Hi"));
        store.toggle_pin(&a);
        let b = store.create_note();

        // A is pinned, so it leads the projection under the default sort
        // even though B was updated later.
        let visible = store.visible_notes();
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].id, a);
        assert_eq!(visible[1].id, b);

        let a_snapshot = store.get_note(&a).unwrap().clone();

        assert!(store.delete_note(&a));
        assert!(store.get_note(&a).is_none());
        assert_eq!(store.trashed_notes().len(), 1);
        assert_eq!(store.current_note().unwrap().id, b);

        assert!(store.restore_note(&a));
        assert_eq!(store.get_note(&a).unwrap(), &a_snapshot);
        assert!(store.trashed_notes().is_empty());
        assert_eq!(store.current_note().unwrap().id, a);
    }

    #[test]
    fn state_survives_reopening() {
        let dir = TempDir::new().unwrap();
        let id = {
            let mut store = open_store(&dir);
            let id = store.create_from_template("kept".into(), "body".into());
            store.add_tag(&id, "persist");
            store.record_version(&id);
            id
        };

        let mut store = open_store(&dir);
        let note = store.get_note(&id).unwrap();
        assert_eq!(note.title, "kept");
        assert_eq!(note.tags, vec!["persist".to_string()]);
        assert_eq!(store.versions(&id).len(), 1);
        assert!(store.trashed_notes().is_empty());
    }

    #[test]
    fn create_inherits_the_active_tag_filter() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.set_tag_filter(Some("work".to_string()));
        let id = store.create_note();
        assert_eq!(store.get_note(&id).unwrap().tags, vec!["work".to_string()]);
        // and the new note is visible under the active filter
        assert!(store.visible_notes().iter().any(|n| n.id == id));
    }

    #[test]
    fn delete_unknown_note_reports_false() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        assert!(!store.delete_note("missing"));
        assert!(!store.restore_note("missing"));
    }

    #[test]
    fn purge_drops_version_history_with_the_note() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        let id = store.create_note();
        store.update_note(&id, NoteUpdate::content("v1"));
        assert!(store.record_version(&id));
        store.delete_note(&id);

        assert!(store.purge_note(&id));
        assert!(store.versions(&id).is_empty());
        assert!(store.trashed_notes().is_empty());
    }

    #[test]
    fn empty_trash_drops_history_of_every_purged_note() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        let a = store.create_note();
        store.update_note(&a, NoteUpdate::content("a"));
        store.record_version(&a);
        let b = store.create_note();
        store.update_note(&b, NoteUpdate::content("b"));
        store.record_version(&b);
        store.delete_note(&a);
        store.delete_note(&b);

        store.empty_trash();
        assert!(store.trashed_notes().is_empty());
        assert!(store.versions(&a).is_empty());
        assert!(store.versions(&b).is_empty());
    }

    #[test]
    fn record_version_deduplicates_unchanged_content() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        let id = store.create_note();
        store.update_note(&id, NoteUpdate::content("draft"));
        assert!(store.record_version(&id));
        assert!(!store.record_version(&id));
        assert_eq!(store.versions(&id).len(), 1);
    }

    #[test]
    fn restore_version_updates_content_but_not_the_log() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        let id = store.create_note();
        store.update_note(&id, NoteUpdate::content("first"));
        store.record_version(&id);
        store.update_note(&id, NoteUpdate::content("second"));
        store.record_version(&id);

        let first = store.versions(&id)[0].clone();
        store.restore_version(&id, &first);
        assert_eq!(store.get_note(&id).unwrap().content, "first");
        assert_eq!(store.versions(&id).len(), 2);
    }

    #[test]
    fn restore_backup_distinguishes_full_and_pairs() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        store.create_note();

        let pairs = r#"[{"title": "imported", "content": "body"}]"#;
        assert_eq!(store.restore_backup(pairs).unwrap(), 1);
        assert_eq!(store.all_notes().len(), 2);
        assert_eq!(store.all_notes()[0].title, "imported");

        let full = store.export_json().unwrap();
        assert_eq!(store.restore_backup(&full).unwrap(), 2);
        assert_eq!(store.all_notes().len(), 2);

        assert!(store.restore_backup("garbage").is_err());
    }

    #[test]
    fn search_ranked_prefers_title_matches() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        let in_title = store.create_from_template("meeting notes".into(), "nothing".into());
        let in_content = store.create_from_template("misc".into(), "meeting agenda".into());
        store.create_from_template("unrelated".into(), "xyz".into());

        let results = store.search_ranked("meeting");
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, in_title);
        assert_eq!(results[1].id, in_content);
    }

    #[test]
    fn select_note_tolerates_dangling_ids() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        let a = store.create_note();
        let b = store.create_note();
        assert_eq!(store.current_note().unwrap().id, b);

        store.select_note(&a);
        assert_eq!(store.current_note().unwrap().id, a);

        store.select_note("missing");
        assert!(store.current_note().is_none());
    }

    #[test]
    fn query_state_drives_the_visible_list() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        let apple = store.create_from_template("apple".into(), "fruit".into());
        let banana = store.create_from_template("banana".into(), "fruit".into());
        store.create_from_template("carrot".into(), "vegetable".into());

        store.set_search("fruit");
        let visible = store.visible_notes();
        assert_eq!(visible.len(), 2);

        store.set_sort(SortKey::Title, SortOrder::Asc);
        let visible = store.visible_notes();
        assert_eq!(visible[0].id, apple);
        assert_eq!(visible[1].id, banana);

        store.set_search("");
        store.set_tag_filter(Some("none".to_string()));
        assert!(store.visible_notes().is_empty());
        assert_eq!(store.filter().selected_tag.as_deref(), Some("none"));
    }

    #[test]
    fn last_saved_tracks_successful_persistence() {
        let dir = TempDir::new().unwrap();
        let mut store = open_store(&dir);
        assert!(store.last_saved().is_none());
        store.create_note();
        assert!(store.last_saved().is_some());
    }
}
