use std::{
    fs::{read_to_string, OpenOptions},
    io::{stdin, stdout, Write},
    path::{Path, PathBuf},
    process::Command,
};

use chrono::Utc;
use log::info;
use shell_words::split;
use tempfile::Builder;

use crate::{
    Commands, HistoryCommands, Note, NoteFilter, NoteStore, NoteUpdate, NotesError, Result,
    SortKey, SortOrder, TrashCommands, DEFAULT_NOTE_CONTENT, DEFAULT_NOTE_TITLE,
};

/// CLI application handler - processes CLI commands against the note store
pub struct App {
    store: NoteStore,
}

impl App {
    /// Create a new CLI application over the given store
    pub fn new(store: NoteStore) -> Self {
        Self { store }
    }

    /// Run the CLI application with the given command
    pub fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Create {
                title,
                content,
                file,
                tags,
                edit,
            } => self.handle_create(title, content, file, tags, edit),

            Commands::View { id, json } => self.handle_view(&id, json),

            Commands::List {
                tag,
                query,
                sort,
                asc,
                limit,
                json,
            } => self.handle_list(tag, query, &sort, asc, limit, json),

            Commands::Search { query, limit, json } => self.handle_search(&query, limit, json),

            Commands::Edit {
                id,
                title,
                content,
                file,
                edit,
                add_tags,
                remove_tags,
            } => self.handle_edit(&id, title, content, file, edit, add_tags, remove_tags),

            Commands::Pin { id } => self.handle_pin(&id),

            Commands::Delete { id, force } => self.handle_delete(&id, force),

            Commands::Trash(command) => self.handle_trash(command),

            Commands::History(command) => self.handle_history(command),

            Commands::Import { file, force } => self.handle_import(&file, force),

            Commands::Export { output } => self.handle_export(output),

            Commands::Backup => self.handle_backup(),
        }
    }

    fn handle_create(
        &mut self,
        title: Option<String>,
        content: Option<String>,
        file: Option<PathBuf>,
        tags: Option<String>,
        edit: bool,
    ) -> Result<()> {
        let content = match (content, file) {
            (Some(c), _) => Some(c),
            (None, Some(path)) => Some(self.read_content_from_file(&path)?),
            (None, None) if edit => {
                let heading = title.as_deref().unwrap_or(DEFAULT_NOTE_TITLE);
                Some(self.open_editor_for_content(heading)?)
            }
            (None, None) => None,
        };

        let id = match (title, content) {
            (None, None) => self.store.create_note(),
            (title, content) => self.store.create_from_template(
                title.unwrap_or_else(|| DEFAULT_NOTE_TITLE.to_string()),
                content.unwrap_or_else(|| DEFAULT_NOTE_CONTENT.to_string()),
            ),
        };

        for tag in parse_tags(tags) {
            self.store.add_tag(&id, &tag);
        }

        println!("Note created with ID: {}", id);
        Ok(())
    }

    fn handle_view(&self, id: &str, json: bool) -> Result<()> {
        let note = self
            .store
            .get_note(id)
            .ok_or_else(|| NotesError::NoteNotFound { id: id.to_string() })?;

        if json {
            println!("{}", serde_json::to_string_pretty(note)?);
        } else {
            self.display_notes_text(std::slice::from_ref(note), true)?;
        }
        Ok(())
    }

    fn handle_list(
        &self,
        tag: Option<String>,
        query: Option<String>,
        sort: &str,
        asc: bool,
        limit: usize,
        json: bool,
    ) -> Result<()> {
        let filter = NoteFilter {
            search: query.unwrap_or_default(),
            selected_tag: tag,
            sort_key: parse_sort_key(sort),
            sort_order: if asc { SortOrder::Asc } else { SortOrder::Desc },
        };

        let mut notes = filter.project(self.store.all_notes());
        if limit > 0 && notes.len() > limit {
            notes.truncate(limit);
        }

        if notes.is_empty() {
            println!("No notes found matching the criteria.");
            return Ok(());
        }

        if json {
            self.display_notes_json(&notes, false)?;
        } else {
            self.display_notes_text(&notes, false)?;
        }

        println!(
            "\nFound {} note{}",
            notes.len(),
            if notes.len() == 1 { "" } else { "s" }
        );
        Ok(())
    }

    fn handle_search(&self, query: &str, limit: usize, json: bool) -> Result<()> {
        let mut results = self.store.search_ranked(query);
        if limit > 0 && results.len() > limit {
            results.truncate(limit);
        }

        if results.is_empty() {
            println!("No notes found matching query: \"{}\"", query);
            return Ok(());
        }

        if json {
            self.display_notes_json(&results, false)?;
        } else {
            self.display_notes_text(&results, false)?;
        }

        println!("\nFound {} matching note(s).", results.len());
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_edit(
        &mut self,
        id: &str,
        title: Option<String>,
        content: Option<String>,
        file: Option<PathBuf>,
        edit: bool,
        add_tags: Option<String>,
        remove_tags: Option<String>,
    ) -> Result<()> {
        if content.is_some() && file.is_some() {
            return Err(NotesError::ApplicationError {
                message: "Cannot specify both --content and --file options".to_string(),
            });
        }
        if (content.is_some() || file.is_some()) && edit {
            return Err(NotesError::ApplicationError {
                message: "Cannot combine --edit with --content or --file".to_string(),
            });
        }

        let note = self
            .store
            .get_note(id)
            .ok_or_else(|| NotesError::NoteNotFound { id: id.to_string() })?
            .clone();

        let new_content = if let Some(c) = content {
            Some(c)
        } else if let Some(path) = file {
            Some(self.read_content_from_file(&path)?)
        } else if edit {
            Some(self.open_editor_with_content(&note.title, &note.content)?)
        } else {
            None
        };

        let update = NoteUpdate {
            title,
            content: new_content,
            tags: None,
        };
        if update.title.is_some() || update.content.is_some() {
            self.store.update_note(id, update);
        }

        for tag in parse_tags(add_tags) {
            self.store.add_tag(id, &tag);
        }
        for tag in parse_tags(remove_tags) {
            self.store.remove_tag(id, &tag);
        }

        // Snapshot the edited state so it can be recovered later.
        self.store.record_version(id);

        println!("Note {} updated successfully", id);
        Ok(())
    }

    fn handle_pin(&mut self, id: &str) -> Result<()> {
        if self.store.get_note(id).is_none() {
            return Err(NotesError::NoteNotFound { id: id.to_string() });
        }
        self.store.toggle_pin(id);
        let pinned = self.store.get_note(id).map(|n| n.is_pinned).unwrap_or(false);
        println!(
            "Note {} is now {}",
            id,
            if pinned { "pinned" } else { "unpinned" }
        );
        Ok(())
    }

    fn handle_delete(&mut self, id: &str, force: bool) -> Result<()> {
        let note = self
            .store
            .get_note(id)
            .ok_or_else(|| NotesError::NoteNotFound { id: id.to_string() })?
            .clone();

        if !force {
            println!("You are about to move the following note to the trash:");
            println!("ID:      {}", note.id);
            println!("Title:   {}", note.title);
            if !note.tags.is_empty() {
                println!("Tags:    {}", note.tags.join(", "));
            }
            println!("Created: {}", note.created_at.format("%Y-%m-%d %H:%M:%S"));

            let retention = self.store.config().trash_retention_days;
            println!("\nTrashed notes are kept for {} days.", retention);
            if !self.confirm("Move this note to the trash?")? {
                println!("Deletion cancelled.");
                return Ok(());
            }
        }

        self.store.delete_note(id);
        println!("Note '{}' ({}) moved to the trash.", note.title, note.id);
        Ok(())
    }

    fn handle_trash(&mut self, command: TrashCommands) -> Result<()> {
        match command {
            TrashCommands::List { json } => {
                let retention = self.store.config().trash_retention_days;
                let entries = self.store.trashed_notes().to_vec();
                if entries.is_empty() {
                    println!("The trash is empty.");
                    return Ok(());
                }
                if json {
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                    return Ok(());
                }
                for entry in &entries {
                    let expires = entry.expires_at(chrono::Duration::days(retention));
                    let days_left = (expires - Utc::now()).num_days().max(0);
                    println!(
                        "{} | {} | deleted {} | {} day(s) until permanent deletion",
                        entry.note.id,
                        console::style(&entry.note.title).bold(),
                        entry.deleted_at.format("%Y-%m-%d %H:%M"),
                        days_left
                    );
                }
                println!("\n{} note(s) in the trash", entries.len());
                Ok(())
            }

            TrashCommands::Restore { id } => {
                if self.store.restore_note(&id) {
                    println!("Note {} restored from the trash.", id);
                    Ok(())
                } else {
                    Err(NotesError::NoteNotFound { id })
                }
            }

            TrashCommands::Purge { id } => {
                if self.store.purge_note(&id) {
                    println!("Note {} permanently deleted.", id);
                    Ok(())
                } else {
                    Err(NotesError::NoteNotFound { id })
                }
            }

            TrashCommands::Empty { force } => {
                let count = self.store.trashed_notes().len();
                if count == 0 {
                    println!("The trash is already empty.");
                    return Ok(());
                }
                if !force {
                    let prompt = format!(
                        "Permanently delete {} note(s)? This cannot be undone.",
                        count
                    );
                    if !self.confirm(&prompt)? {
                        println!("Cancelled.");
                        return Ok(());
                    }
                }
                self.store.empty_trash();
                println!("Trash emptied ({} note(s) permanently deleted).", count);
                Ok(())
            }
        }
    }

    fn handle_history(&mut self, command: HistoryCommands) -> Result<()> {
        match command {
            HistoryCommands::List { id } => {
                let versions = self.store.versions(&id);
                if versions.is_empty() {
                    println!("No saved versions for note {}.", id);
                    return Ok(());
                }
                // Newest first, numbered from 1, matching `history restore -n`.
                for (i, version) in versions.iter().rev().enumerate() {
                    println!(
                        "{}. {} | {} | {} character(s)",
                        i + 1,
                        console::style(&version.title).bold(),
                        version.timestamp.format("%Y-%m-%d %H:%M"),
                        version.content.len()
                    );
                }
                println!("\n{} saved version(s)", versions.len());
                Ok(())
            }

            HistoryCommands::Restore { id, version } => {
                let versions = self.store.versions(&id);
                if version == 0 || version > versions.len() {
                    return Err(NotesError::ApplicationError {
                        message: format!(
                            "Invalid version number {} (note has {} saved version(s))",
                            version,
                            versions.len()
                        ),
                    });
                }
                let snapshot = versions[versions.len() - version].clone();
                self.store.restore_version(&id, &snapshot);
                println!(
                    "Note {} restored to the version from {}.",
                    id,
                    snapshot.timestamp.format("%Y-%m-%d %H:%M")
                );
                Ok(())
            }

            HistoryCommands::Clear { id } => {
                self.store.clear_history(&id);
                println!("Version history cleared for note {}.", id);
                Ok(())
            }
        }
    }

    fn handle_import(&mut self, file: &Path, force: bool) -> Result<()> {
        let data = read_to_string(file)?;

        match crate::parse_backup(&data)? {
            crate::BackupImport::Full(notes) => {
                let existing = self.store.all_notes().len();
                if existing > 0 && !force {
                    let prompt = format!(
                        "This backup replaces all {} existing note(s) with {} note(s). Continue?",
                        existing,
                        notes.len()
                    );
                    if !self.confirm(&prompt)? {
                        println!("Import cancelled.");
                        return Ok(());
                    }
                }
                let count = notes.len();
                self.store.replace_all(notes);
                println!("Restored {} note(s) from {}.", count, file.display());
            }
            crate::BackupImport::Pairs(pairs) => {
                let count = self.store.import_notes(pairs);
                println!("Imported {} note(s) from {}.", count, file.display());
            }
        }
        Ok(())
    }

    fn handle_export(&self, output: Option<PathBuf>) -> Result<()> {
        let data = self.store.export_json()?;
        match output {
            Some(path) => {
                std::fs::write(&path, &data)?;
                println!(
                    "Exported {} note(s) to {}.",
                    self.store.all_notes().len(),
                    path.display()
                );
            }
            None => println!("{}", data),
        }
        Ok(())
    }

    fn handle_backup(&self) -> Result<()> {
        let path = self.store.backup_now()?;
        println!("Backup created at {}.", path.display());
        Ok(())
    }

    // ---- helpers ----

    fn confirm(&self, prompt: &str) -> Result<bool> {
        print!("{} [y/N]: ", prompt);
        stdout().flush().map_err(NotesError::Io)?;

        let mut input = String::new();
        stdin().read_line(&mut input).map_err(NotesError::Io)?;
        let input = input.trim().to_lowercase();
        Ok(input == "y" || input == "yes")
    }

    fn read_content_from_file(&self, path: &Path) -> Result<String> {
        if !path.exists() {
            return Err(NotesError::ApplicationError {
                message: format!("File not found: {}", path.display()),
            });
        }
        if !path.is_file() {
            return Err(NotesError::ApplicationError {
                message: format!("Not a file: {}", path.display()),
            });
        }
        read_to_string(path).map_err(NotesError::Io)
    }

    fn open_editor_for_content(&self, title: &str) -> Result<String> {
        let temp_file = Builder::new().suffix(".md").tempfile()?;
        let temp_path = temp_file.path().to_path_buf();

        self.write_editor_template(&temp_path, title)?;

        info!("Opening editor to write note content. Save and exit when done...");
        self.launch_editor(&temp_path)?;

        let content = read_to_string(&temp_path)?;
        Ok(strip_editor_comments(&content))
    }

    fn open_editor_with_content(&self, title: &str, existing_content: &str) -> Result<String> {
        let temp_file = Builder::new().suffix(".md").tempfile()?;
        let temp_path = temp_file.path().to_path_buf();

        {
            let mut file = OpenOptions::new().write(true).open(&temp_path)?;
            writeln!(file, "<!-- Editing '{}'. Save and exit when done. -->", title)?;
            write!(file, "{}", existing_content)?;
        }

        self.launch_editor(&temp_path)?;

        let content = read_to_string(&temp_path)?;
        Ok(strip_editor_comments(&content))
    }

    fn write_editor_template(&self, path: &Path, title: &str) -> Result<()> {
        let mut file = OpenOptions::new().write(true).open(path)?;

        writeln!(file, "# {}", title)?;
        writeln!(file)?;
        writeln!(file, "<!-- ")?;
        writeln!(
            file,
            "Write your note content below. This note supports Markdown format."
        )?;
        writeln!(
            file,
            "Lines that start with <!-- and end with --> are comments and will be ignored."
        )?;
        writeln!(file, "Save and exit the editor when you're done.")?;
        writeln!(file, "-->")?;
        writeln!(file)?;

        Ok(())
    }

    fn launch_editor(&self, file_path: &Path) -> Result<()> {
        let editor_cmd = self.store.config().get_editor_command();

        let args = split(&editor_cmd).map_err(|e| NotesError::EditorError {
            message: format!("Failed to parse editor command: {}", e),
        })?;

        if args.is_empty() {
            return Err(NotesError::EditorError {
                message: "Empty editor command".to_string(),
            });
        }

        let mut command = Command::new(&args[0]);
        if args.len() > 1 {
            command.args(&args[1..]);
        }
        command.arg(file_path);

        let status = command.status().map_err(|e| NotesError::EditorError {
            message: format!("Failed to launch editor: {}", e),
        })?;

        if !status.success() {
            return Err(NotesError::EditorError {
                message: "Editor exited with non-zero status".to_string(),
            });
        }

        Ok(())
    }

    /// Display notes in JSON format
    fn display_notes_json(&self, notes: &[Note], detailed: bool) -> Result<()> {
        if detailed {
            println!("{}", serde_json::to_string_pretty(notes)?);
        } else {
            // Simplified entries with just the list-level fields
            let simplified: Vec<serde_json::Value> = notes
                .iter()
                .map(|note| {
                    serde_json::json!({
                        "id": note.id,
                        "title": note.title,
                        "tags": note.tags,
                        "isPinned": note.is_pinned,
                        "updatedAt": note.updated_at.to_rfc3339(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&simplified)?);
        }
        Ok(())
    }

    /// Display notes in text format
    fn display_notes_text(&self, notes: &[Note], detailed: bool) -> Result<()> {
        let term_width = terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(80);

        for (i, note) in notes.iter().enumerate() {
            if i > 0 {
                println!("{}", "-".repeat(term_width.min(50)));
            }

            let updated_at = note.updated_at.format("%Y-%m-%d %H:%M");
            let pin_marker = if note.is_pinned { " [pinned]" } else { "" };

            println!("ID: {} | Updated: {}{}", note.id, updated_at, pin_marker);
            println!("Title: {}", console::style(&note.title).bold());

            if !note.tags.is_empty() {
                let tags = note
                    .tags
                    .iter()
                    .map(|tag| format!("#{}", tag))
                    .collect::<Vec<_>>()
                    .join(" ");
                println!("Tags: {}", console::style(tags).cyan());
            }

            if detailed {
                println!("\n{}", note.content);
            } else {
                let preview = content_preview(&note.content, 100);
                if !preview.is_empty() {
                    println!("\n{}", preview);
                }
            }
        }

        Ok(())
    }
}

// Helper for parsing comma-separated tag lists
fn parse_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

fn parse_sort_key(sort: &str) -> SortKey {
    match sort {
        "title" => SortKey::Title,
        "created" => SortKey::CreatedAt,
        _ => SortKey::UpdatedAt,
    }
}

/// Remove HTML comment lines left by the editor template
fn strip_editor_comments(content: &str) -> String {
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with("<!--") && !line.trim_end().ends_with("-->"))
        .collect::<Vec<&str>>()
        .join("\n")
}

/// First non-empty line, truncated for list display
fn content_preview(content: &str, max_len: usize) -> String {
    let first_line = content
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");

    if first_line.chars().count() <= max_len {
        first_line.to_string()
    } else {
        let truncated: String = first_line.chars().take(max_len).collect();
        format!("{}...", truncated)
    }
}
