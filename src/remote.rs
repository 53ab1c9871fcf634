//! Device access: the listing/transfer seam and the `adb` implementation

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::entry::EntryRecord;
use crate::listing::parse_line;
use crate::logger::Logger;

/// Listing and transfer operations against one device
pub trait RemoteDevice {
    /// Raw `ls -la` output for `dir` (trailing `/` form)
    fn list_dir(&self, dir: &str) -> Result<String>;

    /// Copy the bytes of `remote` into `local`
    fn pull(&self, remote: &str, local: &Path) -> Result<()>;
}

/// Talks to a device through the `adb` executable
#[derive(Debug, Clone)]
pub struct AdbDevice {
    adb: PathBuf,
    serial: Option<String>,
}

impl AdbDevice {
    pub fn new(adb: impl Into<PathBuf>, serial: Option<String>) -> Self {
        Self {
            adb: adb.into(),
            serial: serial.filter(|s| !s.is_empty()),
        }
    }

    pub fn serial(&self) -> Option<&str> {
        self.serial.as_deref()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.adb);
        if let Some(serial) = &self.serial {
            cmd.arg("-s").arg(serial);
        }
        cmd
    }

    fn run(&self, mut cmd: Command, what: &str) -> Result<String> {
        let output = cmd
            .output()
            .with_context(|| format!("Failed to execute {} for {what}", self.adb.display()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{what} failed ({}): {}", output.status, stderr.trim());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl RemoteDevice for AdbDevice {
    fn list_dir(&self, dir: &str) -> Result<String> {
        let mut cmd = self.command();
        // adb shell joins its arguments into a single remote command line
        cmd.arg("shell")
            .arg("ls")
            .arg("-la")
            .arg(shell_quote(dir));
        self.run(cmd, &format!("listing {dir}"))
    }

    fn pull(&self, remote: &str, local: &Path) -> Result<()> {
        let mut cmd = self.command();
        cmd.arg("pull").arg(remote).arg(local);
        self.run(cmd, &format!("pull {remote}"))?;
        Ok(())
    }
}

/// Single-quote `s` for the device shell
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', "'\\''"))
}

/// Remote path of a child directory, in trailing `/` form
pub fn child_dir(parent: &str, name: &str) -> String {
    format!("{}{}/", parent, name)
}

/// Remote path of a child file
pub fn child_file(parent: &str, name: &str) -> String {
    format!("{}{}", parent, name)
}

/// List the immediate children of `dir`.
///
/// One listing call per invocation. Lines that do not parse are reported to
/// `logger` and dropped; a failing listing call is returned as an error.
pub fn read_dir(
    device: &dyn RemoteDevice,
    dir: &str,
    logger: &dyn Logger,
) -> Result<Vec<EntryRecord>> {
    logger.listing(dir);
    let output = device
        .list_dir(dir)
        .with_context(|| format!("Failed to list remote directory {dir}"))?;

    let mut entries = Vec::new();
    for line in output.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok(entry) if entry.name() == "." || entry.name() == ".." => {}
            Ok(entry) => entries.push(entry),
            Err(e) => logger.skipped_line(dir, line, &e.to_string()),
        }
    }
    Ok(entries)
}
