//! User preferences persisted between sessions.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::geometry::Presentation;
use crate::model::Category;
use crate::project::DEFAULT_FILE_NAME;

fn default_export_file_name() -> String {
    DEFAULT_FILE_NAME.to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppConfigData {
    /// Suggested name in the project save dialog.
    #[serde(default = "default_export_file_name")]
    pub export_file_name: String,

    /// Category selected at startup.
    #[serde(default)]
    pub default_category: Category,

    #[serde(default)]
    pub rotated_presentation: bool,

    /// Where the file dialogs open.
    #[serde(default)]
    pub last_directory: Option<PathBuf>,
}

impl Default for AppConfigData {
    fn default() -> Self {
        Self {
            export_file_name: default_export_file_name(),
            default_category: Category::default(),
            rotated_presentation: false,
            last_directory: None,
        }
    }
}

impl AppConfigData {
    pub fn presentation(&self) -> Presentation {
        if self.rotated_presentation {
            Presentation::Rotated
        } else {
            Presentation::Upright
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub data: AppConfigData,
    /// None when no config directory exists on this platform; saves are skipped.
    pub config_path: Option<PathBuf>,
    /// Set when the file on disk was unusable and defaults were substituted.
    pub reset_reason: Option<String>,
}

/// Platform config location, `<config dir>/jonnybox/config.json`.
pub fn config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("jonnybox").join("config.json"))
}

impl AppConfig {
    pub fn load() -> Self {
        match config_file() {
            Some(path) => Self::load_from(path),
            None => {
                tracing::warn!("no config directory on this platform, using defaults");
                Self {
                    data: AppConfigData::default(),
                    config_path: None,
                    reset_reason: None,
                }
            }
        }
    }

    /// Never fails: a missing file gives defaults, a broken one gives
    /// defaults plus `reset_reason`.
    pub fn load_from(path: PathBuf) -> Self {
        let (data, reset_reason) = match read_data(&path) {
            Ok(Some(data)) => {
                tracing::info!(path = ?path, "config loaded");
                (data, None)
            }
            Ok(None) => {
                tracing::info!(path = ?path, "no config file, using defaults");
                (AppConfigData::default(), None)
            }
            Err(reason) => {
                tracing::warn!(path = ?path, "{}", reason);
                (AppConfigData::default(), Some(reason))
            }
        };

        Self {
            data,
            config_path: Some(path),
            reset_reason,
        }
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.config_path else {
            return Ok(());
        };
        save_to(&self.data, path)?;
        tracing::debug!(path = ?path, "config saved");
        Ok(())
    }

    /// Hand out the reset notice once.
    pub fn take_reset_reason(&mut self) -> Option<String> {
        self.reset_reason.take()
    }

    /// Remember the directory of a file the user just picked.
    pub fn remember_directory(&mut self, file: &Path) -> bool {
        let Some(dir) = file.parent() else {
            return false;
        };
        if self.data.last_directory.as_deref() == Some(dir) {
            return false;
        }
        self.data.last_directory = Some(dir.to_path_buf());
        true
    }
}

/// `Ok(None)` when there is no file yet; `Err` carries the notice shown
/// to the user.
fn read_data(path: &Path) -> std::result::Result<Option<AppConfigData>, String> {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(format!("Could not read configuration file: {e}")),
    };
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| format!("Configuration file was corrupted: {e}"))
}

fn save_to(data: &AppConfigData, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(dir.path().join("config.json"));
        assert_eq!(config.data, AppConfigData::default());
        assert_eq!(config.data.export_file_name, "jonnybox_project.json");
        assert_eq!(config.data.default_category, Category::Screw);
        assert!(config.reset_reason.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = AppConfig::load_from(path.clone());
        config.data.default_category = Category::Component;
        config.data.rotated_presentation = true;
        assert!(config.remember_directory(&dir.path().join("photo.png")));
        config.save().unwrap();

        let reloaded = AppConfig::load_from(path);
        assert_eq!(reloaded.data, config.data);
        assert_eq!(reloaded.data.presentation(), Presentation::Rotated);
        assert_eq!(reloaded.data.last_directory.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_corrupt_file_resets_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let mut config = AppConfig::load_from(path);
        assert_eq!(config.data, AppConfigData::default());
        let reason = config.take_reset_reason().unwrap();
        assert!(reason.starts_with("Configuration file was corrupted"));
        assert!(config.take_reset_reason().is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"default_category": "bolt"}"#).unwrap();

        let config = AppConfig::load_from(path);
        assert_eq!(config.data.default_category, Category::Bolt);
        assert_eq!(config.data.export_file_name, DEFAULT_FILE_NAME);
        assert!(!config.data.rotated_presentation);
    }

    #[test]
    fn test_remember_same_directory_is_not_a_change() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::load_from(dir.path().join("config.json"));
        assert!(config.remember_directory(&dir.path().join("a.png")));
        assert!(!config.remember_directory(&dir.path().join("b.png")));
    }

    #[test]
    fn test_unreadable_file_resets() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be cannot be read as text.
        let path = dir.path().join("config.json");
        std::fs::create_dir(&path).unwrap();

        let mut config = AppConfig::load_from(path);
        assert_eq!(config.data, AppConfigData::default());
        let reason = config.take_reset_reason().unwrap();
        assert!(reason.starts_with("Could not read configuration file"));
    }
}
