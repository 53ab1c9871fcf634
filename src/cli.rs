//! Command-line surface and option resolution

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use crate::config::Config;
use crate::url::{parse_local_dest, parse_remote_source};

/// Command-line arguments
#[derive(Clone, Debug, Default, Parser)]
#[command(
    author,
    version,
    about = "Sync a directory tree from an Android device to this computer, copying only new or changed files"
)]
pub struct Args {
    /// Location to sync from: [DEVICE]:PATH/ (leave DEVICE empty for the default device)
    pub source: String,

    /// Location to sync to: local PATH/
    pub destination: String,

    /// Perform a trial run with no changes made
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Also report up-to-date files and dropped listing lines
    #[arg(short, long)]
    pub verbose: bool,

    /// adb executable to use
    #[arg(long)]
    pub adb: Option<PathBuf>,

    /// Append a timestamped text log to this file
    #[arg(long = "log-file")]
    pub log_file: Option<PathBuf>,

    /// Append JSON-lines events to this file
    #[arg(long = "json-log")]
    pub json_log: Option<PathBuf>,

    /// Configuration file (default: ~/.config/adbsync/adbsync.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Everything a run needs, after merging CLI, SOURCE and config
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    pub adb: PathBuf,
    pub device: Option<String>,
    pub remote_root: String,
    pub local_root: PathBuf,
    pub dry_run: bool,
    pub verbose: bool,
    pub log_file: Option<PathBuf>,
    pub json_log: Option<PathBuf>,
}

impl Args {
    /// Flags win over the device named in SOURCE, which wins over config
    pub fn resolve(&self, config: &Config) -> Result<Settings> {
        let source = parse_remote_source(&self.source)?;
        let local_root = parse_local_dest(&self.destination)?;
        Ok(Settings {
            adb: self.adb.clone().unwrap_or_else(|| config.adb_path()),
            device: source.device.or_else(|| config.device.clone()),
            remote_root: source.path,
            local_root,
            dry_run: self.dry_run,
            verbose: self.verbose,
            log_file: self.log_file.clone().or_else(|| config.log_file.clone()),
            json_log: self.json_log.clone().or_else(|| config.json_log.clone()),
        })
    }
}
