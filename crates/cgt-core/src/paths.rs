//! Platform config directory shared by every CG-Transport binary.
//!
//! - Windows:  `%APPDATA%\CgTransport`
//! - Linux:    `$XDG_CONFIG_HOME/cgtransport` (or `~/.config/cgtransport`)
//! - macOS:    `~/Library/Application Support/CgTransport`

use std::path::PathBuf;

/// Returns `None` when the relevant environment variable is unset or the
/// platform is not one of the three above.
pub fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("CgTransport"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("cgtransport"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME")
            .map(|h| PathBuf::from(h).join("Library").join("Application Support").join("CgTransport"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}
