//! Cache validators derived from file metadata.
//!
//! The ETag is a pure function of `(size, mtime)`: identical inputs
//! always produce the identical tag across process restarts, and any
//! content change (a re-encode touches both size and mtime) changes it.
//! Last-Modified is rendered at one-second resolution and doubles as the
//! comparison basis for date-form `If-Range` values.

use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// ETag and Last-Modified for a media asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validators {
    /// Quoted opaque tag, e.g. `"98968-18c2a7d4f3b"`.
    pub etag: String,
    /// RFC 7231 HTTP-date, e.g. `Wed, 21 Oct 2015 07:28:00 GMT`.
    pub last_modified: String,
}

impl Validators {
    /// Derive validators from file size and modification time.
    pub fn from_metadata(size: u64, modified: SystemTime) -> Self {
        let mtime_ms = modified
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self {
            etag: format!("\"{:x}-{:x}\"", size, mtime_ms),
            last_modified: http_date(modified),
        }
    }

    /// Check an `If-None-Match` header against the current ETag.
    pub fn if_none_match_contains(&self, header: &str) -> bool {
        header
            .split(',')
            .map(str::trim)
            .any(|tag| tag == self.etag || tag == "*")
    }

    /// Check an `If-Range` value against the current validators.
    ///
    /// Opaque form (leading `"` or `W/`) compares against the ETag;
    /// date form compares the parsed date, re-rendered as an HTTP-date,
    /// against Last-Modified. Anything unparseable is a mismatch.
    pub fn if_range_matches(&self, value: &str) -> bool {
        let trimmed = value.trim();
        if trimmed.starts_with('"') || trimmed.starts_with("W/") {
            return trimmed == self.etag;
        }
        match DateTime::parse_from_rfc2822(trimmed) {
            Ok(date) => http_date(date.with_timezone(&Utc).into()) == self.last_modified,
            Err(_) => false,
        }
    }
}

/// Render a `SystemTime` as an RFC 7231 HTTP-date (one-second resolution).
pub fn http_date(time: SystemTime) -> String {
    let dt: DateTime<Utc> = time.into();
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
