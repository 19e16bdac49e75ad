use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub encoding: EncodingConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Storage root holding `original/` and `hls/`. Required for both
    /// serving and encoding; may also come from STREAMFORGE_STORAGE_ROOT.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Cache-Control header sent with every media response.
    #[serde(default = "default_cache_control")]
    pub cache_control: String,
}

fn default_cache_control() -> String {
    "public, max-age=86400, immutable".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: None,
            cache_control: default_cache_control(),
        }
    }
}

/// Single-rendition HLS encoding parameters.
///
/// Defaults are tuned for low-CPU hosts with reasonable quality: 720p
/// cap, veryfast preset, 4-second segments.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EncodingConfig {
    /// HLS segment duration in seconds (default: 4).
    #[serde(default = "default_segment_seconds")]
    pub segment_seconds: u32,

    /// x264 constant rate factor (default: 22).
    #[serde(default = "default_crf")]
    pub crf: u32,

    /// ffmpeg scale filter expression (default: `scale=-2:720`).
    #[serde(default = "default_scale")]
    pub scale: String,

    /// x264 preset (default: veryfast).
    #[serde(default = "default_preset")]
    pub preset: String,

    /// AAC audio bitrate (default: 128k).
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

fn default_segment_seconds() -> u32 {
    4
}
fn default_crf() -> u32 {
    22
}
fn default_scale() -> String {
    "scale=-2:720".to_string()
}
fn default_preset() -> String {
    "veryfast".to_string()
}
fn default_audio_bitrate() -> String {
    "128k".to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            segment_seconds: default_segment_seconds(),
            crf: default_crf(),
            scale: default_scale(),
            preset: default_preset(),
            audio_bitrate: default_audio_bitrate(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    /// Encoder binary name or path (default: ffmpeg, resolved via PATH).
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(config.storage.root.is_none());
        assert_eq!(
            config.storage.cache_control,
            "public, max-age=86400, immutable"
        );
        assert_eq!(config.encoding.segment_seconds, 4);
        assert_eq!(config.encoding.crf, 22);
        assert_eq!(config.encoding.scale, "scale=-2:720");
        assert_eq!(config.encoding.preset, "veryfast");
        assert_eq!(config.encoding.audio_bitrate, "128k");
        assert_eq!(config.tools.ffmpeg, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [storage]
            root = "/data/media"

            [encoding]
            crf = 20
            "#,
        )
        .unwrap();
        assert_eq!(config.storage.root, Some(PathBuf::from("/data/media")));
        assert_eq!(config.encoding.crf, 20);
        assert_eq!(config.encoding.segment_seconds, 4);
        assert_eq!(config.server.port, 8080);
    }
}
