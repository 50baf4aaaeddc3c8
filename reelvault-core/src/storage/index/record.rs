//! Normalization of raw index records.
//!
//! The index file may have been written by older releases or edited by hand,
//! so each field is coerced into the strict [`BlobEntry`] shape here. Nothing
//! past this boundary ever sees a malformed value.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::collections::HashSet;
use std::time::Duration;

use crate::storage::types::{BlobDigest, BlobEntry, Comment, TtlSpec};

/// Result of normalizing a whole index document
#[derive(Debug, Default)]
pub(crate) struct Normalized {
    pub entries: BTreeMap<BlobDigest, BlobEntry>,
    /// Fields that had to be coerced or defaulted
    pub repaired_fields: usize,
    /// Records that could not be salvaged (no usable filename, duplicate filename)
    pub dropped: usize,
    /// The root was not a mapping and the index was reset
    pub reset: bool,
}

pub(crate) fn normalize_document(root: Value, now: i64, default_ttl: Duration) -> Normalized {
    let Value::Object(records) = root else {
        return Normalized {
            reset: true,
            ..Default::default()
        };
    };

    let mut out = Normalized::default();
    let mut seen_filenames = HashSet::new();

    for (digest, raw) in records {
        if digest.is_empty() {
            out.dropped += 1;
            continue;
        }
        let Some((entry, repaired)) = normalize_entry(&raw, now, default_ttl) else {
            tracing::warn!(digest = %digest, "dropping index record without a usable filename");
            out.dropped += 1;
            continue;
        };
        if !seen_filenames.insert(entry.filename.clone()) {
            tracing::warn!(digest = %digest, filename = %entry.filename, "dropping index record sharing a filename");
            out.dropped += 1;
            continue;
        }
        out.repaired_fields += repaired;
        out.entries.insert(BlobDigest::from_string(digest), entry);
    }

    out
}

/// Coerce one record. Returns the entry and the number of repaired fields,
/// or `None` if the record has no filename to anchor it.
fn normalize_entry(raw: &Value, now: i64, default_ttl: Duration) -> Option<(BlobEntry, usize)> {
    let record = raw.as_object()?;
    let filename = record
        .get("filename")
        .and_then(Value::as_str)
        .filter(|f| !f.is_empty() && !f.contains(['/', '\\']))?
        .to_string();

    let mut repaired = 0;

    let (title, fixed) = title_field(record);
    repaired += usize::from(fixed);

    let (likes, fixed) = likes_field(record);
    repaired += usize::from(fixed);

    let (comments, fixed) = comments_field(record);
    repaired += usize::from(fixed);

    let is_permanent = match record.get("isPermanent") {
        Some(Value::Bool(b)) => *b,
        _ => {
            repaired += 1;
            false
        }
    };

    let expires_at = match record.get("expiresAt") {
        None | Some(Value::Null) => None,
        Some(v) => {
            let parsed = v.as_i64().or_else(|| v.as_f64().filter(|f| f.is_finite()).map(|f| f as i64));
            if parsed.is_none() {
                repaired += 1;
            }
            parsed
        }
    };

    let expires_at = if is_permanent {
        if expires_at.is_some() {
            repaired += 1;
        }
        None
    } else if expires_at.is_none() {
        // A time-limited entry with no deadline gets a fresh default lifetime
        repaired += 1;
        TtlSpec::Default.resolve(now, default_ttl).expires_at
    } else {
        expires_at
    };

    Some((
        BlobEntry {
            filename,
            title,
            expires_at,
            is_permanent,
            likes,
            comments,
        },
        repaired,
    ))
}

fn title_field(record: &Map<String, Value>) -> (Option<String>, bool) {
    match record.get("title") {
        None | Some(Value::Null) => (None, false),
        Some(Value::String(s)) => (Some(s.clone()), false),
        // Older writers sometimes stored the title as a one-element array
        Some(Value::Array(items)) => (items.first().and_then(Value::as_str).map(str::to_string), true),
        Some(_) => (None, true),
    }
}

fn likes_field(record: &Map<String, Value>) -> (u64, bool) {
    match record.get("likes") {
        Some(v) => match v.as_u64() {
            Some(n) => (n, false),
            None => {
                let salvaged = v
                    .as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .map(|f| f as u64)
                    .unwrap_or(0);
                (salvaged, true)
            }
        },
        None => (0, true),
    }
}

fn comments_field(record: &Map<String, Value>) -> (Vec<Comment>, bool) {
    let Some(Value::Array(items)) = record.get("comments") else {
        return (Vec::new(), true);
    };

    let comments: Vec<Comment> = items
        .iter()
        .filter_map(|item| serde_json::from_value::<Comment>(item.clone()).ok())
        .collect();
    let fixed = comments.len() != items.len();
    (comments, fixed)
}
