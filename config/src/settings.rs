//! Application settings management

use crate::PathManager;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application settings stored in settings.toml
///
/// Every field has a default, so a partial file (or no file at all) is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the uploaded blobs
    pub storage_dir: PathBuf,
    /// Path of the JSON index file
    pub index_path: PathBuf,
    /// Lifetime of an upload that carries no TTL
    pub default_ttl_hours: u64,
    /// Seconds between two lifecycle sweeps
    pub sweep_interval_secs: u64,
    /// Largest accepted upload
    pub max_upload_bytes: u64,
    /// Accepted file extensions, with the leading dot (e.g. ".mp4")
    pub allowed_extensions: Vec<String>,
    /// Key required for listing and deleting. `API_KEY` takes precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Logs are also written to a daily rolling file here. Defaults to the
    /// data directory's `logs/`; without one, logs go to stderr only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_dir: PathManager::storage_dir().unwrap_or_else(|| PathBuf::from("public/videos")),
            index_path: PathManager::index_path()
                .unwrap_or_else(|| PathBuf::from("file-hash-map.json")),
            default_ttl_hours: 24,
            sweep_interval_secs: 60 * 60,
            max_upload_bytes: 100 * 1024 * 1024,
            allowed_extensions: vec![".mp4".into(), ".webm".into(), ".mkv".into()],
            api_key: None,
            log_dir: PathManager::logs_dir(),
        }
    }
}

impl Settings {
    /// Load settings from the settings file, or return defaults if not found
    pub fn load() -> Self {
        let Some(path) = PathManager::settings_path() else {
            return Self::default();
        };

        let Ok(content) = fs::read_to_string(&path) else {
            return Self::default();
        };

        toml::from_str(&content).unwrap_or_default()
    }

    /// Load settings from an explicit path. Unlike [`Settings::load`], a
    /// missing or malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_toml(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply `REELVAULT_*` and `API_KEY` environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(dir) = std::env::var("REELVAULT_STORAGE_DIR") {
            self.storage_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("REELVAULT_INDEX_PATH") {
            self.index_path = PathBuf::from(path);
        }
        if let Some(secs) = std::env::var("REELVAULT_SWEEP_INTERVAL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.sweep_interval_secs = secs;
        }
        if let Ok(key) = std::env::var("API_KEY") {
            if !key.is_empty() {
                self.api_key = Some(key);
            }
        }
        self
    }

    /// Save settings to the settings file
    pub fn save(&self) -> Result<PathBuf, String> {
        let path = PathManager::settings_path().ok_or("Could not determine settings path")?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config dir: {}", e))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;
        fs::write(path, content).map_err(|e| format!("Failed to write settings: {}", e))?;
        Ok(())
    }
}
