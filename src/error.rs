//! Error types shared across the media resolver, streaming handler, and
//! encoding pipeline.

use axum::http::StatusCode;

/// Errors produced while resolving and serving media assets.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    /// The identifier was syntactically unusable (empty, embedded NUL).
    #[error("Malformed identifier: {0}")]
    BadIdentifier(String),

    /// The identifier attempted to escape the storage root.
    #[error("Access denied")]
    Forbidden,

    /// The identifier was well-formed but no file exists for it.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An unexpected filesystem failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a new BadIdentifier error.
    pub fn bad_identifier<S: Into<String>>(msg: S) -> Self {
        Self::BadIdentifier(msg.into())
    }

    /// Create a new NotFound error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// HTTP status code this error maps to.
    ///
    /// Traversal attempts are always 403 and never reveal whether the
    /// target exists; a well-formed identifier with no file behind it
    /// is 404.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadIdentifier(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Result type alias using [`MediaError`].
pub type Result<T> = std::result::Result<T, MediaError>;
