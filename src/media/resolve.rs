//! Identifier resolution with traversal safety.
//!
//! Turns a caller-supplied relative identifier into a canonical path
//! that is guaranteed to stay under the storage root. Containment is
//! checked by canonical-path prefix comparison, not substring matching,
//! so encoded separators, `..` segments, and symlinks pointing outside
//! the root are all rejected.

use crate::error::{MediaError, Result};
use crate::media::{ContentKind, MediaAsset};
use std::path::{Component, Path, PathBuf};

/// Resolve an identifier against a canonicalized storage root.
///
/// Returns 400-class errors for unusable identifiers, [`MediaError::Forbidden`]
/// for anything that tries to escape the root, and [`MediaError::NotFound`]
/// for well-formed identifiers with no regular file behind them.
pub fn resolve(root: &Path, raw: &str) -> Result<MediaAsset> {
    let identifier = raw.trim().replace('\\', "/");
    if identifier.is_empty() || identifier.contains('\0') {
        return Err(MediaError::bad_identifier(
            "identifier is empty or contains NUL",
        ));
    }

    let relative = sanitize(&identifier)?;
    let joined = root.join(&relative);

    // Canonicalize to collapse symlinks before the containment check.
    // Anything short of a permission failure means the path does not
    // name a readable file, so it answers NotFound. That covers missing
    // entries and identifiers that descend through a regular file
    // (NotADirectory), which HLS clients produce for flat assets.
    let canonical = match joined.canonicalize() {
        Ok(p) => p,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(e.into());
        }
        Err(_) => return Err(MediaError::not_found(identifier)),
    };

    if !canonical.starts_with(root) {
        return Err(MediaError::Forbidden);
    }

    let metadata = std::fs::metadata(&canonical)?;
    if !metadata.is_file() {
        return Err(MediaError::not_found(identifier));
    }

    let kind = ContentKind::from_path(&canonical);
    Ok(MediaAsset {
        identifier,
        size: metadata.len(),
        modified: metadata.modified()?,
        path: canonical,
        kind,
    })
}

/// Reduce an identifier to plain relative components.
///
/// Any `..` segment, absolute fragment, or Windows drive prefix is a
/// traversal attempt and answers Forbidden regardless of whether the
/// target exists.
fn sanitize(identifier: &str) -> Result<PathBuf> {
    let mut clean = PathBuf::new();
    for component in Path::new(identifier).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(MediaError::Forbidden);
            }
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(MediaError::bad_identifier("identifier has no path components"));
    }
    Ok(clean)
}

/// Check that a bare asset id (a single path segment) is safe to use as
/// a directory name under the derived root.
///
/// Used by the encoding pipeline when deriving ids from source file
/// stems, so a malicious filename can never write outside the output
/// tree.
pub fn is_safe_asset_id(id: &str) -> bool {
    !id.is_empty()
        && !id.contains("..")
        && !id.contains('/')
        && !id.contains('\\')
        && !id.contains('\0')
}
