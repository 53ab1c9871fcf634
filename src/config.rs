//! Optional TOML configuration
//!
//! ```toml
//! adb = "/opt/android-sdk/platform-tools/adb"
//! device = "emulator-5554"
//! log_file = "/var/log/adbsync.log"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ADB: &str = "adb";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// adb executable; `adb` on PATH when unset
    pub adb: Option<PathBuf>,
    /// Device serial used when SOURCE names none
    pub device: Option<String>,
    pub log_file: Option<PathBuf>,
    pub json_log: Option<PathBuf>,
}

impl Config {
    pub fn adb_path(&self) -> PathBuf {
        self.adb
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ADB))
    }
}

pub fn config_dir() -> PathBuf {
    #[cfg(windows)]
    {
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("adbsync");
        }
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".config").join("adbsync");
    }
    PathBuf::from(".adbsync")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("adbsync.toml")
}

pub fn parse_config(data: &str) -> Result<Config> {
    Ok(toml::from_str(data)?)
}

/// Load `explicit` if given (must exist), else the default file if present
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => {
            let p = default_config_path();
            if !p.exists() {
                return Ok(Config::default());
            }
            p
        }
    };
    let data = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    parse_config(&data).with_context(|| format!("Invalid config {}", path.display()))
}
