//! Application settings persistence for Smart Notes.
//!
//! Stores the notes database location and the generation endpoint
//! configuration in a JSON file at an OS-appropriate location. The API key
//! may also come from the `SMARTNOTES_API_KEY` environment variable, which
//! wins over the file.

use crate::core::generation::GeminiClient;
use crate::{Result, SmartnotesError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides [`GenerationSettings::api_key`].
pub const API_KEY_ENV: &str = "SMARTNOTES_API_KEY";

/// Persisted application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    /// Path of the SQLite notes database.
    pub database_path: String,
    pub generation: GenerationSettings,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            database_path: default_database_path().to_string_lossy().to_string(),
            generation: GenerationSettings::default(),
        }
    }
}

/// Where and how suggestions are generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationSettings {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Tone requested for refinements, e.g. `professional`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    /// Character limit requested for refinements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: GeminiClient::DEFAULT_BASE_URL.to_string(),
            model: GeminiClient::DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_secs: 30,
            tone: None,
            max_length: None,
        }
    }
}

/// Returns the path to the settings JSON file.
///
/// - macOS / Linux: `~/.config/smartnotes/settings.json`
/// - Windows: `%APPDATA%/Smartnotes/settings.json`
pub fn settings_file_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("Smartnotes").join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("smartnotes").join("settings.json")
    }
}

/// Returns the default database path: `<data dir>/smartnotes/notes.db`.
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local")
                .join("share")
        })
        .join("smartnotes")
        .join("notes.db")
}

/// Loads settings from the default location, then applies the environment.
pub fn load_settings() -> AppSettings {
    let mut settings = load_settings_from(settings_file_path());
    apply_api_key_override(&mut settings, std::env::var(API_KEY_ENV).ok());
    settings
}

/// Loads settings from `path`; returns defaults if the file is missing or corrupt.
pub fn load_settings_from<P: AsRef<Path>>(path: P) -> AppSettings {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
            log::warn!("ignoring unreadable settings at {}: {e}", path.display());
            AppSettings::default()
        }),
        Err(_) => AppSettings::default(),
    }
}

/// Replaces the stored API key with `key` when it is set and non-empty.
pub fn apply_api_key_override(settings: &mut AppSettings, key: Option<String>) {
    if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
        settings.generation.api_key = Some(key);
    }
}

/// Saves settings to the default location.
pub fn save_settings(settings: &AppSettings) -> Result<()> {
    save_settings_to(settings, settings_file_path())
}

/// Saves settings to `path`, creating parent directories as needed.
pub fn save_settings_to<P: AsRef<Path>>(settings: &AppSettings, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            SmartnotesError::Config(format!("Failed to create settings directory: {e}"))
        })?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    Ok(())
}
