//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates a tempdir-backed storage root
//! and a full [`AppContext`]. The [`with_server`] constructor starts
//! Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use streamforge::config::Config;
use streamforge::server::{create_router, AppContext};

/// Test harness wrapping a fully-constructed [`AppContext`] backed by a
/// temporary storage root.
pub struct TestHarness {
    pub ctx: AppContext,
    pub root: PathBuf,
    _dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new harness with default configuration and an empty
    /// storage root.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a new harness with a custom configuration.
    pub fn with_config(mut config: Config) -> Self {
        let dir = tempfile::tempdir().expect("failed to create storage tempdir");
        let root = dir
            .path()
            .canonicalize()
            .expect("failed to canonicalize storage root");
        config.storage.root = Some(root.clone());

        let ctx = AppContext {
            config: Arc::new(config),
            storage_root: Arc::new(root.clone()),
        };

        Self {
            ctx,
            root,
            _dir: dir,
        }
    }

    /// Write a file under the storage root, creating parent directories.
    pub fn write_file(&self, relative: &str, data: &[u8]) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent dirs");
        }
        std::fs::write(&path, data).expect("failed to write fixture file");
        path
    }

    /// Storage root path as given to the server.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Start an Axum server on a random port and return the harness
    /// together with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::serve(Self::new()).await
    }

    /// Start an Axum server with custom config on a random port.
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        Self::serve(Self::with_config(config)).await
    }

    async fn serve(harness: Self) -> (Self, SocketAddr) {
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }
}
