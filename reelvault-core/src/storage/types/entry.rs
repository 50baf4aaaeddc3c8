//! Index entry types

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{BlobDigest, Expiry};

/// A comment attached to a blob
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    /// RFC 3339 timestamp taken when the comment was appended
    pub timestamp: String,
}

impl Comment {
    pub fn new(text: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            text: text.into(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Metadata for one unique piece of content.
///
/// This is exactly the per-digest object of the index file, so field names
/// and shapes must stay stable across releases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobEntry {
    pub filename: String,
    pub title: Option<String>,
    /// Epoch milliseconds; `None` when permanent
    pub expires_at: Option<i64>,
    pub is_permanent: bool,
    pub likes: u64,
    pub comments: Vec<Comment>,
}

impl BlobEntry {
    pub fn new(filename: impl Into<String>, title: Option<String>, expiry: Expiry) -> Self {
        Self {
            filename: filename.into(),
            title,
            expires_at: expiry.expires_at,
            is_permanent: expiry.is_permanent,
            likes: 0,
            comments: Vec::new(),
        }
    }

    /// Re-arm the expiry from a later write of the same content.
    ///
    /// Returns false (and changes nothing) once the entry is permanent.
    pub fn rearm(&mut self, expiry: Expiry) -> bool {
        if self.is_permanent {
            return false;
        }
        self.is_permanent = expiry.is_permanent;
        self.expires_at = if expiry.is_permanent { None } else { expiry.expires_at };
        true
    }

    pub fn is_expired(&self, now: i64) -> bool {
        !self.is_permanent && self.expires_at.is_some_and(|at| at < now)
    }
}

/// Result of a `put`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PutOutcome {
    pub digest: BlobDigest,
    pub filename: String,
    pub is_duplicate: bool,
    /// Size of the uploaded payload
    pub size: u64,
    pub entry: BlobEntry,
}

/// An index entry confirmed against the storage directory
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedBlob {
    pub digest: BlobDigest,
    pub filename: String,
    pub title: Option<String>,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_permanent: bool,
    pub mime_type: &'static str,
    pub likes: u64,
    pub comments: Vec<Comment>,
}

/// What a delete should remove
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// Every file in the storage directory and the whole index
    All,
    File(String),
}

impl DeleteTarget {
    pub fn parse(raw: &str) -> Self {
        if raw == "all" {
            DeleteTarget::All
        } else {
            DeleteTarget::File(raw.to_string())
        }
    }
}

/// Result of a delete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub files_removed: usize,
    pub entries_removed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entry_wire_shape() {
        let mut entry = BlobEntry::new(
            "abc.mp4",
            None,
            Expiry {
                is_permanent: false,
                expires_at: Some(42),
            },
        );
        entry.comments.push(Comment {
            text: "nice".into(),
            timestamp: "2024-01-01T00:00:00.000Z".into(),
        });

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({
                "filename": "abc.mp4",
                "title": null,
                "expiresAt": 42,
                "isPermanent": false,
                "likes": 0,
                "comments": [{ "text": "nice", "timestamp": "2024-01-01T00:00:00.000Z" }]
            })
        );
    }

    #[test]
    fn test_rearm_stops_at_permanent() {
        let mut entry = BlobEntry::new(
            "abc.mp4",
            None,
            Expiry {
                is_permanent: false,
                expires_at: Some(10),
            },
        );

        assert!(entry.rearm(Expiry {
            is_permanent: false,
            expires_at: Some(20),
        }));
        assert_eq!(entry.expires_at, Some(20));

        assert!(entry.rearm(Expiry::permanent()));
        assert!(entry.is_permanent);
        assert_eq!(entry.expires_at, None);

        assert!(!entry.rearm(Expiry {
            is_permanent: false,
            expires_at: Some(30),
        }));
        assert!(entry.is_permanent);
        assert_eq!(entry.expires_at, None);
    }

    #[test]
    fn test_is_expired() {
        let entry = BlobEntry::new(
            "a.mp4",
            None,
            Expiry {
                is_permanent: false,
                expires_at: Some(100),
            },
        );
        assert!(entry.is_expired(101));
        assert!(!entry.is_expired(100));

        let permanent = BlobEntry::new("b.mp4", None, Expiry::permanent());
        assert!(!permanent.is_expired(i64::MAX));
    }

    #[test]
    fn test_delete_target() {
        assert_eq!(DeleteTarget::parse("all"), DeleteTarget::All);
        assert_eq!(
            DeleteTarget::parse("abc.mp4"),
            DeleteTarget::File("abc.mp4".into())
        );
    }
}
