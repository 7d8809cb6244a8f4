use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::{BUILTIN_STATUSES, CustomStatus, Subtask, is_builtin_status};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoardSettings {
    #[serde(default)]
    pub custom_statuses: Vec<CustomStatus>,
    /// Subtasks typed into the add form but not yet saved.
    #[serde(default)]
    pub draft_subtasks: Vec<Subtask>,
}

/// Preferences that live only on this machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub boards: BTreeMap<String, BoardSettings>,
}

fn default_language() -> String {
    "en".to_string()
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            language: default_language(),
            boards: BTreeMap::new(),
        }
    }
}

impl ClientSettings {
    /// Best effort: a missing or unreadable file yields defaults.
    pub fn load(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                warn!(path = %path.display(), "could not read settings: {}", e);
                return Self::default();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            warn!(path = %path.display(), "ignoring malformed settings: {}", e);
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn board(&self, board_id: &str) -> Option<&BoardSettings> {
        self.boards.get(board_id)
    }

    pub fn board_mut(&mut self, board_id: &str) -> &mut BoardSettings {
        self.boards.entry(board_id.to_string()).or_default()
    }

    pub fn custom_statuses(&self, board_id: &str) -> &[CustomStatus] {
        self.board(board_id)
            .map(|b| b.custom_statuses.as_slice())
            .unwrap_or(&[])
    }

    /// Built-in columns followed by the board's custom ones.
    pub fn column_ids(&self, board_id: &str) -> Vec<String> {
        BUILTIN_STATUSES
            .iter()
            .map(|s| s.to_string())
            .chain(self.custom_statuses(board_id).iter().map(|s| s.name.clone()))
            .collect()
    }

    pub fn add_custom_status(&mut self, board_id: &str, status: CustomStatus) -> Result<(), SettingsError> {
        let name = status.name.trim();
        if name.is_empty() {
            return Err(SettingsError::Invalid("Please enter a column name".to_string()));
        }
        if is_builtin_status(name) {
            return Err(SettingsError::Invalid(format!("\"{name}\" is a built-in column")));
        }
        if matches!(name, "." | "..") {
            return Err(SettingsError::Invalid(format!("\"{name}\" cannot be used as a column name")));
        }
        if self.custom_statuses(board_id).iter().any(|s| s.name == name) {
            return Err(SettingsError::Invalid(format!("Column \"{name}\" already exists")));
        }

        let status = CustomStatus::new(name, status.icon);
        self.board_mut(board_id).custom_statuses.push(status);
        Ok(())
    }

    pub fn remove_custom_status(&mut self, board_id: &str, name: &str) -> bool {
        let Some(board) = self.boards.get_mut(board_id) else {
            return false;
        };
        let before = board.custom_statuses.len();
        board.custom_statuses.retain(|s| s.name != name);
        board.custom_statuses.len() != before
    }

    pub fn remove_board(&mut self, board_id: &str) {
        self.boards.remove(board_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_and_duplicate_columns_are_rejected() {
        let mut settings = ClientSettings::default();
        settings
            .add_custom_status("b1", CustomStatus::new("review", "FiEye"))
            .unwrap();

        assert!(settings.add_custom_status("b1", CustomStatus::new("done", "x")).is_err());
        assert!(settings.add_custom_status("b1", CustomStatus::new("review", "x")).is_err());
        assert!(settings.add_custom_status("b1", CustomStatus::new("  ", "x")).is_err());
        assert!(settings.add_custom_status("b1", CustomStatus::new("..", "x")).is_err());
        assert_eq!(settings.column_ids("b1"), ["todo", "inprogress", "done", "review"]);
        assert_eq!(settings.column_ids("other"), ["todo", "inprogress", "done"]);
    }

    #[test]
    fn save_then_load_restores_preferences() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = ClientSettings {
            theme: Theme::Dark,
            ..ClientSettings::default()
        };
        settings
            .add_custom_status("b1", CustomStatus::new("blocked", "FiSlash"))
            .unwrap();
        settings.board_mut("b1").draft_subtasks = vec![Subtask::new("Outline")];
        settings.save(&path).unwrap();

        assert_eq!(ClientSettings::load(&path), settings);
    }

    #[test]
    fn unreadable_settings_fall_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert_eq!(ClientSettings::load(&missing), ClientSettings::default());

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert_eq!(ClientSettings::load(&broken), ClientSettings::default());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let settings: ClientSettings =
            serde_json::from_str(r#"{"boards":{"b1":{"custom_statuses":[{"name":"qa"}]}}}"#).unwrap();
        assert_eq!(settings.language, "en");
        assert_eq!(settings.custom_statuses("b1")[0].icon, "FiCheckCircle");
    }
}
