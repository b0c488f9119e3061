//! Centralized directory paths for the alert agent.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! # Environment Overrides
//!
//! - `ALFRED_DATA_DIR` overrides [`data_dir`]
//! - `ALFRED_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

/// Application data root directory.
///
/// Holds the default cookie jar. Resolves to `dirs::data_dir()/alfred/`
/// by default.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ALFRED_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("alfred"))
        .unwrap_or_else(|| PathBuf::from("/tmp/alfred-data"))
}

/// Application config directory (`config.toml` lives here).
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ALFRED_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("alfred"))
        .unwrap_or_else(|| PathBuf::from("/tmp/alfred-config"))
}

/// Default cookie jar location (`data_dir()/cookies.json`).
#[must_use]
pub fn cookie_jar_file() -> PathBuf {
    data_dir().join("cookies.json")
}

/// Default config file location (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
