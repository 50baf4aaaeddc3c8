//! The JSON index file

use serde::Serialize;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{error, warn};

use crate::error::IndexFileError;

/// What was found at the index path
#[derive(Debug)]
pub(crate) enum RawIndex {
    /// No index yet (first start)
    Missing,
    Document(Value),
    /// Unreadable or not JSON; already moved aside
    Corrupt,
}

#[derive(Debug, Clone)]
pub(crate) struct IndexFile {
    path: PathBuf,
}

impl IndexFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> RawIndex {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return RawIndex::Missing,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "failed to read index file");
                self.quarantine().await;
                return RawIndex::Corrupt;
            }
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => RawIndex::Document(value),
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "index file is not valid JSON");
                self.quarantine().await;
                RawIndex::Corrupt
            }
        }
    }

    /// Keep a corrupt index around for inspection instead of overwriting it
    async fn quarantine(&self) {
        let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S");
        let mut aside = self.path.clone().into_os_string();
        aside.push(format!(".corrupt-{}", stamp));
        let aside = PathBuf::from(aside);

        match fs::rename(&self.path, &aside).await {
            Ok(()) => warn!(path = %aside.display(), "moved corrupt index aside"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "could not move corrupt index aside"),
        }
    }

    /// Write `snapshot` atomically (temp file + rename)
    pub async fn write<T: Serialize + ?Sized>(&self, snapshot: &T) -> Result<(), IndexFileError> {
        let json = serde_json::to_vec_pretty(snapshot)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        let mut file = fs::File::create(&temp).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}
