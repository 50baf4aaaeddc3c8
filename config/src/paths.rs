use std::path::PathBuf;
use std::sync::OnceLock;

static DATA_DIR_OVERRIDE: OnceLock<PathBuf> = OnceLock::new();

pub struct PathManager;

impl PathManager {
    /// Set a custom data directory (e.g. `--data-dir` on the command line)
    pub fn set_data_dir(path: PathBuf) {
        let _ = DATA_DIR_OVERRIDE.set(path);
    }

    fn base_data_dir() -> Option<PathBuf> {
        if let Some(d) = DATA_DIR_OVERRIDE.get() {
            return Some(d.clone());
        }
        dirs::data_dir().map(|d| d.join("reelvault"))
    }

    pub fn data_dir() -> Option<PathBuf> {
        Self::base_data_dir()
    }

    pub fn config_dir() -> Option<PathBuf> {
        if DATA_DIR_OVERRIDE.get().is_some() {
            return Self::data_dir();
        }
        dirs::config_dir().map(|d| d.join("reelvault"))
    }

    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("settings.toml"))
    }

    /// Directory holding the uploaded blobs
    pub fn storage_dir() -> Option<PathBuf> {
        Self::data_dir().map(|d| d.join("videos"))
    }

    /// JSON index mapping digests to blob metadata
    pub fn index_path() -> Option<PathBuf> {
        Self::data_dir().map(|d| d.join("file-hash-map.json"))
    }

    pub fn logs_dir() -> Option<PathBuf> {
        Self::data_dir().map(|d| d.join("logs"))
    }

    pub fn ensure_dirs_exist() -> std::io::Result<()> {
        if let Some(d) = Self::data_dir() {
            std::fs::create_dir_all(&d)?;
        }
        if let Some(d) = Self::config_dir() {
            std::fs::create_dir_all(&d)?;
        }
        if let Some(d) = Self::logs_dir() {
            std::fs::create_dir_all(&d)?;
        }
        Ok(())
    }
}
