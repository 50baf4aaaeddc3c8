//! Upload acceptance rules and extension helpers

use std::path::Path;

use crate::error::ValidationError;

pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Lowercase an extension and give it a leading dot (`"MP4"` -> `".mp4"`).
/// An empty extension stays empty.
pub fn normalize_extension(raw: &str) -> String {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(".{}", trimmed.to_lowercase())
    }
}

/// Normalized extension of an original upload name (`"Clip.MP4"` -> `".mp4"`)
pub fn extension_of(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(normalize_extension)
        .unwrap_or_default()
}

/// MIME type served for a stored extension
pub fn mime_for_extension(ext: &str) -> &'static str {
    match normalize_extension(ext).as_str() {
        ".mp4" => "video/mp4",
        ".webm" => "video/webm",
        ".mkv" => "video/x-matroska",
        ".avi" => "video/x-msvideo",
        ".mov" => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// Which uploads are accepted at all
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    /// Normalized extensions; empty accepts everything
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UPLOAD_BYTES, [".mp4", ".webm", ".mkv"])
    }
}

impl UploadPolicy {
    pub fn new<I, S>(max_bytes: u64, allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            max_bytes,
            allowed_extensions: allowed
                .into_iter()
                .map(|e| normalize_extension(e.as_ref()))
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Accept everything (used by tests and tools that bypass the upload layer)
    pub fn permissive() -> Self {
        Self {
            max_bytes: u64::MAX,
            allowed_extensions: Vec::new(),
        }
    }

    /// Check an upload of `size` bytes with an already-normalized extension
    pub fn check(&self, size: u64, extension: &str) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::Empty);
        }
        if size > self.max_bytes {
            return Err(ValidationError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        if !self.allowed_extensions.is_empty()
            && !self.allowed_extensions.iter().any(|e| e == extension)
        {
            return Err(ValidationError::UnsupportedType(extension.to_string()));
        }
        Ok(())
    }
}
