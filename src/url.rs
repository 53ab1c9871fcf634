//! Parsing of `[DEVICE]:PATH/` sources and `PATH/` destinations

use anyhow::{bail, Result};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSource {
    /// `None` selects the default device
    pub device: Option<String>,
    /// Directory on the device, always ending in `/`
    pub path: String,
}

/// Split at the last `:` so serials like `192.168.1.5:5555` survive
pub fn parse_remote_source(s: &str) -> Result<RemoteSource> {
    let Some((device, path)) = s.rsplit_once(':') else {
        bail!("source must be a device path of the form [DEVICE]:PATH/, got {s:?}");
    };
    if path.is_empty() {
        bail!("source path is empty in {s:?}");
    }
    if !path.ends_with('/') {
        bail!("source must be a directory ending in '/', got {path:?}");
    }
    Ok(RemoteSource {
        device: if device.is_empty() {
            None
        } else {
            Some(device.to_string())
        },
        path: path.to_string(),
    })
}

pub fn parse_local_dest(s: &str) -> Result<PathBuf> {
    let is_sep = |c: char| c == '/' || c == std::path::MAIN_SEPARATOR;
    if !s.ends_with(is_sep) {
        bail!("destination must be a directory ending in '/', got {s:?}");
    }
    Ok(PathBuf::from(s))
}
