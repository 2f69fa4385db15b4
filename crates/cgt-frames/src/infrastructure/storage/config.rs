//! TOML configuration for the frame transport.
//!
//! Read from `frames.toml` in the platform config directory (see
//! [`cgt_core::paths`]) unless a path is given explicitly.
//!
//! ```toml
//! log_level = "debug"
//!
//! [shm]
//! dir = "/dev/shm"
//! yuv_capacity = 8294400
//! acquire_timeout_ms = 4
//!
//! [names.video_texture]
//! mapping = "studio_texture_frames"
//! frame_ready = "studio_texture_ready"
//! started = "studio_texture_started"
//! stopped = "studio_texture_stopped"
//! ```
//!
//! Every field has a default, so a missing file and an empty file both give
//! a working configuration that matches the well-known names.

use std::path::{Path, PathBuf};
use std::time::Duration;

use cgt_core::frame::slot_count;
use cgt_core::layout::ChannelNames;
use cgt_core::paths::platform_config_dir;
use cgt_core::MediaKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "frames.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FramesConfig {
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub shm: ShmConfig,
    #[serde(default)]
    pub names: ChannelNames,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShmConfig {
    /// Directory holding the region and event files.
    #[serde(default = "default_shm_dir")]
    pub dir: PathBuf,
    /// Bytes reserved for one YUV frame (default: 1080p NV12).
    #[serde(default = "default_yuv_capacity")]
    pub yuv_capacity: u64,
    /// Bytes reserved for one packed audio frame.
    #[serde(default = "default_audio_capacity")]
    pub audio_capacity: u64,
    /// How long `acquire_slot` waits for the consumer before overwriting.
    #[serde(default = "default_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_shm_dir() -> PathBuf {
    let dev_shm = Path::new("/dev/shm");
    if cfg!(target_os = "linux") && dev_shm.is_dir() {
        dev_shm.to_path_buf()
    } else {
        std::env::temp_dir().join("cgtransport")
    }
}
fn default_yuv_capacity() -> u64 {
    1920 * 1080 * 3 / 2
}
fn default_audio_capacity() -> u64 {
    64 * 1024
}
fn default_acquire_timeout_ms() -> u64 {
    2
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            shm: ShmConfig::default(),
            names: ChannelNames::default(),
        }
    }
}

impl Default for ShmConfig {
    fn default() -> Self {
        Self {
            dir: default_shm_dir(),
            yuv_capacity: default_yuv_capacity(),
            audio_capacity: default_audio_capacity(),
            acquire_timeout_ms: default_acquire_timeout_ms(),
        }
    }
}

impl ShmConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    /// Payload bytes per slot for a region of `kind`.
    ///
    /// Texture slots carry only metadata, so they have no payload area.
    pub fn slot_capacity(&self, kind: MediaKind) -> u64 {
        match kind {
            MediaKind::Audio => self.audio_capacity,
            MediaKind::VideoYuv => self.yuv_capacity,
            MediaKind::VideoTexture => 0,
        }
    }

    pub fn slot_count(&self, kind: MediaKind) -> u32 {
        slot_count(kind) as u32
    }
}

/// Platform config directory for CG-Transport.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the configuration from `explicit`, or from the platform config file.
///
/// A missing platform file yields defaults; a missing explicit file is an
/// error, since the caller asked for it by name.
pub fn load_config(explicit: Option<&Path>) -> Result<FramesConfig, ConfigError> {
    let (path, required) = match explicit {
        Some(p) => (p.to_path_buf(), true),
        None => (config_dir()?.join(CONFIG_FILE_NAME), false),
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => Ok(FramesConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let cfg: FramesConfig = toml::from_str("").expect("deserialize");
        assert_eq!(cfg, FramesConfig::default());
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.shm.yuv_capacity, 3_110_400);
    }

    #[test]
    fn test_partial_shm_section_keeps_other_defaults() {
        // Arrange
        let toml_str = r#"
[shm]
acquire_timeout_ms = 8
"#;

        // Act
        let cfg: FramesConfig = toml::from_str(toml_str).expect("deserialize");

        // Assert
        assert_eq!(cfg.shm.acquire_timeout(), Duration::from_millis(8));
        assert_eq!(cfg.shm.audio_capacity, default_audio_capacity());
        assert_eq!(cfg.names, ChannelNames::default());
    }

    #[test]
    fn test_slot_layout_by_kind() {
        let shm = ShmConfig::default();
        assert_eq!(shm.slot_count(MediaKind::VideoTexture), 2);
        assert_eq!(shm.slot_capacity(MediaKind::VideoTexture), 0);
        assert_eq!(shm.slot_count(MediaKind::Audio), 1);
        assert_eq!(shm.slot_capacity(MediaKind::Audio), 65_536);
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let mut cfg = FramesConfig::default();
        cfg.shm.dir = PathBuf::from("/tmp/frames");
        cfg.names.do_not_present = "no_present".to_string();

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let restored: FramesConfig = toml::from_str(&text).expect("deserialize");

        assert_eq!(restored, cfg);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = load_config(Some(Path::new("/definitely/not/here/frames.toml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
