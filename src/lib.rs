//! Streamforge - HLS encoding pipeline and range-aware media server
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod encoding;
pub mod error;
pub mod media;
pub mod server;
pub mod streaming;
