//! Centralized filesystem locations for sayface.
//!
//! Uses the [`dirs`] crate for platform-appropriate resolution.
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | Data (avatars, videos) | `~/Library/Application Support/sayface/` | `~/.local/share/sayface/` |
//! | Config | `~/Library/Application Support/sayface/` | `~/.config/sayface/` |
//!
//! # Environment Overrides
//!
//! - `SAYFACE_DATA_DIR` overrides [`data_dir`]
//! - `SAYFACE_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("SAYFACE_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("sayface"))
        .unwrap_or_else(|| PathBuf::from("/tmp/sayface-data"))
}

/// Application config directory.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("SAYFACE_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("sayface"))
        .unwrap_or_else(|| PathBuf::from("/tmp/sayface-config"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Stored avatars (`data_dir()/avatars/`).
#[must_use]
pub fn avatars_dir() -> PathBuf {
    data_dir().join("avatars")
}

/// Lip-sync video output (`data_dir()/lipsync/`).
#[must_use]
pub fn videos_dir() -> PathBuf {
    data_dir().join("lipsync")
}
