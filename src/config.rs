use std::{fs, path::PathBuf};

use directories::ProjectDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use which::which;

use crate::Result;

/// File name of the configuration file inside the data directory.
const CONFIG_FILE: &str = "config.json";

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Directory where note state is stored
    pub data_dir: PathBuf,

    /// Directory for backups
    pub backup_dir: PathBuf,

    /// Maximum number of backups to keep
    pub max_backups: u32,

    /// Whether to back up the live notes before destructive operations
    pub auto_backup: bool,

    /// Days a trashed note is kept before lazy expiry
    pub trash_retention_days: i64,

    /// Maximum number of versions kept per note
    pub max_versions: usize,

    /// Default editor command
    pub editor_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = ProjectDirs::from("", "", "mdnotes")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".mdnotes"));
        Self::for_data_dir(data_dir)
    }
}

impl Config {
    /// Default settings rooted at the given data directory.
    pub fn for_data_dir(data_dir: PathBuf) -> Self {
        let backup_dir = data_dir.join("backups");
        Config {
            data_dir,
            backup_dir,
            max_backups: 10,
            auto_backup: true,
            trash_retention_days: 30,
            max_versions: 10,
            editor_command: None,
        }
    }

    /// Loads the configuration, preferring a `config.json` in the data
    /// directory. A missing or unreadable file falls back to defaults; the
    /// data directory itself always follows `data_dir_override` when given.
    pub fn load(data_dir_override: Option<PathBuf>) -> Self {
        let defaults = match data_dir_override {
            Some(dir) => Config::for_data_dir(dir),
            None => Config::default(),
        };

        let path = defaults.data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return defaults;
        }

        match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str::<Config>(&data) {
                Ok(mut config) => {
                    // The file lives in the data directory; the directory it
                    // was found in wins over whatever it recorded.
                    config.data_dir = defaults.data_dir;
                    config
                }
                Err(e) => {
                    warn!("Ignoring malformed config {}: {}", path.display(), e);
                    defaults
                }
            },
            Err(e) => {
                warn!("Failed to read config {}: {}", path.display(), e);
                defaults
            }
        }
    }

    /// Writes the configuration to `config.json` in the data directory.
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let path = self.data_dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    // This method provides smart fallbacks when no editor is configured
    pub fn get_editor_command(&self) -> String {
        // First try the configured editor
        if let Some(editor) = &self.editor_command {
            return editor.clone();
        }

        // Then try environment variable
        if let Ok(editor) = std::env::var("EDITOR") {
            return editor;
        }

        // Fall back to platform defaults
        if cfg!(windows) {
            "notepad".to_string()
        } else if cfg!(target_os = "macos") {
            "open -t".to_string()
        } else {
            // Try common Linux editors
            for editor in &["nano", "vim", "vi", "emacs"] {
                if which(editor).is_ok() {
                    return editor.to_string();
                }
            }
            "nano".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn load_falls_back_to_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(Some(dir.path().to_path_buf()));
        assert_eq!(config.data_dir, dir.path());
        assert_eq!(config.trash_retention_days, 30);
        assert_eq!(config.max_versions, 10);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::for_data_dir(dir.path().to_path_buf());
        config.max_backups = 3;
        config.editor_command = Some("vi".to_string());
        config.save().unwrap();

        let loaded = Config::load(Some(dir.path().to_path_buf()));
        assert_eq!(loaded.max_backups, 3);
        assert_eq!(loaded.editor_command.as_deref(), Some("vi"));
    }

    #[test]
    fn malformed_config_is_ignored() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "{not json").unwrap();
        let config = Config::load(Some(dir.path().to_path_buf()));
        assert_eq!(config.max_backups, 10);
    }
}
