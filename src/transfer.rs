//! Applying copy decisions to the local filesystem

use anyhow::{Context, Result};
use filetime::{set_file_times, FileTime};
use std::fs;
use std::path::Path;

use crate::entry::EntryRecord;
use crate::remote::RemoteDevice;

/// Pulls files from the device and stamps them with the remote mtime.
///
/// In dry-run mode every method returns immediately without touching the
/// local filesystem or the device.
pub struct TransferExecutor<'a> {
    device: &'a dyn RemoteDevice,
    dry_run: bool,
}

impl<'a> TransferExecutor<'a> {
    pub fn new(device: &'a dyn RemoteDevice, dry_run: bool) -> Self {
        Self { device, dry_run }
    }

    /// Create `path` and its parents if missing
    pub fn ensure_dir(&self, path: &Path) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {}", path.display()))
    }

    /// Copy `remote` to `target` and set its mtime from `entry`
    pub fn execute(&self, entry: &EntryRecord, remote: &str, target: &Path) -> Result<()> {
        if self.dry_run {
            return Ok(());
        }

        if let Some(parent) = target.parent() {
            self.ensure_dir(parent)?;
        }

        self.device
            .pull(remote, target)
            .with_context(|| format!("Failed to pull {remote}"))?;

        if !entry.is_directory() {
            let mtime = FileTime::from_unix_time(entry.modified_epoch(), 0);
            set_file_times(target, FileTime::now(), mtime).with_context(|| {
                format!("Failed to set modification time on {}", target.display())
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::parse_line;
    use anyhow::bail;
    use std::cell::RefCell;

    #[derive(Default)]
    struct WritingDevice {
        fail: bool,
        pulls: RefCell<Vec<String>>,
    }

    impl RemoteDevice for WritingDevice {
        fn list_dir(&self, _dir: &str) -> Result<String> {
            Ok(String::new())
        }
        fn pull(&self, remote: &str, local: &Path) -> Result<()> {
            self.pulls.borrow_mut().push(remote.to_string());
            if self.fail {
                bail!("remote object '{remote}' does not exist");
            }
            fs::write(local, b"0123456789")?;
            Ok(())
        }
    }

    #[test]
    fn pull_creates_parents_and_sets_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let device = WritingDevice::default();
        let exec = TransferExecutor::new(&device, false);
        let entry = parse_line("-rw-r--r-- u g 10 2020-01-01 10:00 a.txt").unwrap();
        let target = dir.path().join("nested/deeper/a.txt");

        exec.execute(&entry, "/sdcard/nested/deeper/a.txt", &target).unwrap();

        assert_eq!(*device.pulls.borrow(), vec!["/sdcard/nested/deeper/a.txt".to_string()]);
        let meta = fs::metadata(&target).unwrap();
        let mtime = FileTime::from_last_modification_time(&meta);
        assert_eq!(mtime.unix_seconds(), entry.modified_epoch());
        assert_eq!(mtime.nanoseconds(), 0);
    }

    #[test]
    fn dry_run_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let device = WritingDevice::default();
        let exec = TransferExecutor::new(&device, true);
        let entry = parse_line("-rw-r--r-- u g 10 2020-01-01 10:00 a.txt").unwrap();
        let target = dir.path().join("nested/a.txt");

        exec.ensure_dir(&dir.path().join("made")).unwrap();
        exec.execute(&entry, "/sdcard/nested/a.txt", &target).unwrap();

        assert!(device.pulls.borrow().is_empty());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn pull_failure_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let device = WritingDevice {
            fail: true,
            ..Default::default()
        };
        let exec = TransferExecutor::new(&device, false);
        let entry = parse_line("-rw-r--r-- u g 10 2020-01-01 10:00 gone.txt").unwrap();
        let err = exec
            .execute(&entry, "/sdcard/gone.txt", &dir.path().join("gone.txt"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to pull /sdcard/gone.txt");
        assert!(format!("{err:#}").contains("does not exist"));
    }
}
