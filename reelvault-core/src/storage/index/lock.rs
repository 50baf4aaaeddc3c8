//! Exclusive ownership of an index file across processes

use fs4::fs_std::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::StoreError;

/// Advisory lock on `<index>.lock`, released when dropped.
///
/// Only one [`ContentIndex`](super::ContentIndex) may own an index file at a
/// time; a second opener, in this process or another, is refused.
#[derive(Debug)]
pub(crate) struct IndexLock {
    path: PathBuf,
    _file: File,
}

impl IndexLock {
    pub fn path_for(index_path: &Path) -> PathBuf {
        let mut path = index_path.as_os_str().to_owned();
        path.push(".lock");
        PathBuf::from(path)
    }

    pub fn acquire(index_path: &Path) -> Result<Self, StoreError> {
        let path = Self::path_for(index_path);
        let failed = |cause: std::io::Error| StoreError::Storage {
            context: format!("locking {}", path.display()),
            cause: cause.into(),
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(failed)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(failed)?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!(path = %path.display(), "index lock acquired");
                Ok(Self { path, _file: file })
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Err(StoreError::IndexInUse {
                path: index_path.to_path_buf(),
            }),
            Err(e) => Err(failed(e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
