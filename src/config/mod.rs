mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable overriding `[storage] root`.
pub const STORAGE_ROOT_ENV: &str = "STREAMFORGE_STORAGE_ROOT";

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env_overrides(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./streamforge.toml",
        "~/.config/streamforge/config.toml",
        "/etc/streamforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    // Return default config if no file found
    let mut config = Config::default();
    apply_env_overrides(&mut config);
    validate_config(&config)?;
    Ok(config)
}

/// Fold environment overrides into a loaded config.
fn apply_env_overrides(config: &mut Config) {
    if let Ok(root) = std::env::var(STORAGE_ROOT_ENV) {
        if !root.trim().is_empty() {
            config.storage.root = Some(PathBuf::from(root));
        }
    }
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if config.encoding.segment_seconds == 0 {
        anyhow::bail!("Segment duration cannot be 0 seconds");
    }

    if let Some(root) = &config.storage.root {
        if !root.exists() {
            tracing::warn!("Storage root does not exist: {:?}", root);
        }
    }

    Ok(())
}

/// Resolve the configured storage root, canonicalized.
///
/// Both the server and the encoding pipeline refuse to start without
/// one; everything they touch lives under it.
pub fn storage_root(config: &Config) -> Result<PathBuf> {
    let root = config.storage.root.as_ref().with_context(|| {
        format!(
            "Storage root is not configured (set [storage] root or {})",
            STORAGE_ROOT_ENV
        )
    })?;
    root.canonicalize()
        .with_context(|| format!("Storage root is not accessible: {:?}", root))
}
