//! TOML configuration for the input client, read from `input.toml`.
//!
//! ```toml
//! log_level = "debug"
//!
//! [device]
//! vendor_id = 0x1209
//! product_id = 0xC617
//!
//! [viewport]
//! width = 2560
//! height = 1440
//! ```

use std::path::{Path, PathBuf};

use cgt_core::hid::{HidDeviceSelector, Viewport};
use cgt_core::paths::platform_config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "input.toml";

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
pub struct InputConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "HidDeviceSelector::default")]
    pub device: HidDeviceSelector,
    /// Screen size used to scale pixel positions into logical units.
    #[serde(default)]
    pub viewport: Viewport,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            device: HidDeviceSelector::default(),
            viewport: Viewport::default(),
        }
    }
}

/// Loads `explicit`, or `input.toml` from the platform config directory.
///
/// A missing platform file yields defaults; a missing explicit file is an error.
pub fn load_config(explicit: Option<&Path>) -> Result<InputConfig, ConfigError> {
    let (path, required) = match explicit {
        Some(p) => (p.to_path_buf(), true),
        None => (
            platform_config_dir()
                .ok_or(ConfigError::NoPlatformConfigDir)?
                .join(CONFIG_FILE_NAME),
            false,
        ),
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => Ok(InputConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_contract_defaults() {
        let cfg: InputConfig = toml::from_str("").expect("deserialize");
        assert_eq!(cfg, InputConfig::default());
        assert_eq!(cfg.device.vendor_id, 0x1209);
        assert_eq!(cfg.viewport, Viewport { width: 1920, height: 1080 });
    }

    #[test]
    fn test_device_override_keeps_interface_defaults() {
        // Arrange
        let toml_str = r#"
log_level = "trace"

[device]
product_id = 0x0001

[viewport]
width = 2560
height = 1440
"#;

        // Act
        let cfg: InputConfig = toml::from_str(toml_str).expect("deserialize");

        // Assert
        assert_eq!(cfg.log_level, "trace");
        assert_eq!(cfg.device.product_id, 1);
        assert_eq!(cfg.device.vendor_id, 0x1209);
        assert_eq!(cfg.device.control, HidDeviceSelector::default().control);
        assert_eq!(cfg.viewport.width, 2560);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = load_config(Some(Path::new("/definitely/not/here/input.toml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
