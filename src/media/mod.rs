//! Media asset model: identifiers, content kinds, and MIME types.
//!
//! A [`MediaAsset`] is the result of resolving a caller-supplied
//! identifier against the storage root; its path is canonical and
//! guaranteed to live under the root.

pub mod range;
pub mod resolve;
pub mod validators;

pub use resolve::resolve;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Source file extensions the encoding pipeline recognizes.
pub const SOURCE_EXTENSIONS: &[&str] = &["mp4", "mov"];

/// A resolved media asset, safe to serve.
#[derive(Debug, Clone)]
pub struct MediaAsset {
    /// The identifier as supplied by the caller (normalized separators).
    pub identifier: String,
    /// Canonical absolute path, always a descendant of the storage root.
    pub path: PathBuf,
    /// File size in bytes.
    pub size: u64,
    /// Modification time from the filesystem.
    pub modified: SystemTime,
    /// What the file is, by extension.
    pub kind: ContentKind,
}

/// Coarse classification of served files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Whole-file video served with range support (mp4, mov).
    ProgressiveVideo,
    /// HLS playlist (m3u8).
    Manifest,
    /// HLS media segment (ts).
    Segment,
    /// Anything else under the root.
    Other,
}

impl ContentKind {
    /// Classify a path by its extension.
    pub fn from_path(path: &Path) -> Self {
        match lowercase_extension(path).as_deref() {
            Some("mp4") | Some("mov") => Self::ProgressiveVideo,
            Some("m3u8") => Self::Manifest,
            Some("ts") => Self::Segment,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProgressiveVideo => "progressive-video",
            Self::Manifest => "manifest",
            Self::Segment => "segment",
            Self::Other => "other",
        }
    }
}

/// Determine the Content-Type for a path by its extension.
pub fn content_type(path: &Path) -> &'static str {
    match lowercase_extension(path).as_deref() {
        Some("mp4") => "video/mp4",
        Some("mov") => "video/quicktime",
        Some("m3u8") => "application/x-mpegURL",
        Some("ts") => "video/mp2t",
        _ => "application/octet-stream",
    }
}

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}
