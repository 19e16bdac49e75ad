//! Media streaming module.
//!
//! Serves progressive video and HLS manifests/segments from the storage
//! root with byte-range and conditional-caching semantics.
//!
//! # Routes
//!
//! - `GET|HEAD /media/{identifier}` - flat identifiers (`intro.mp4`)
//! - `GET|HEAD /media/{assetId}/...` - nested HLS paths
//!   (`hls/intro/master.m3u8`, `hls/intro/segment_003.ts`)
//!
//! A single wildcard route covers both shapes; every request goes
//! through the same resolver and range negotiator.

mod serve;

pub use serve::serve_media;

use axum::{routing::get, Router};

use crate::server::AppContext;

/// Create the media streaming router.
///
/// `get` also matches HEAD; the handler branches on the method so HEAD
/// never opens a read stream.
pub fn media_router() -> Router<AppContext> {
    Router::new().route("/*identifier", get(serve_media))
}
