//! Walks the remote tree and decides what to copy
//!
//! A remote regular file is up to date when a local file exists at the mapped
//! path with the same size and the same modification minute. The listing has
//! no seconds field, so both sides are compared at minute granularity.
//! Directories are never compared themselves, only their contents.

use anyhow::{Context, Result};
use filetime::FileTime;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::entry::EntryRecord;
use crate::logger::Logger;
use crate::remote::{child_dir, child_file, read_dir, RemoteDevice};
use crate::transfer::TransferExecutor;

/// Why a file is (re)copied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyReason {
    Missing,
    SizeChanged,
    MtimeChanged,
}

impl CopyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CopyReason::Missing => "missing",
            CopyReason::SizeChanged => "size_changed",
            CopyReason::MtimeChanged => "mtime_changed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Skip,
    Copy(CopyReason),
    Descend,
}

/// File counters for one run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncTotals {
    pub considered: u64,
    pub copied: u64,
}

impl SyncTotals {
    pub fn add_file(&mut self, copied: bool) {
        self.considered += 1;
        if copied {
            self.copied += 1;
        }
    }

    pub fn up_to_date(&self) -> u64 {
        self.considered - self.copied
    }
}

fn minute(unix_seconds: i64) -> i64 {
    unix_seconds.div_euclid(60)
}

/// Decide what to do with `entry` given the local path it maps to.
///
/// Only a missing target counts as "copy"; any other stat failure is an
/// error.
pub fn classify(entry: &EntryRecord, target: &Path) -> Result<Decision> {
    if entry.is_directory() {
        return Ok(Decision::Descend);
    }

    let meta = match fs::metadata(target) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Ok(Decision::Copy(CopyReason::Missing))
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to stat {}", target.display()))
        }
    };

    if entry.size() != Some(meta.len()) {
        return Ok(Decision::Copy(CopyReason::SizeChanged));
    }
    let local = FileTime::from_last_modification_time(&meta).unix_seconds();
    if minute(local) != minute(entry.modified_epoch()) {
        return Ok(Decision::Copy(CopyReason::MtimeChanged));
    }
    Ok(Decision::Skip)
}

/// Children of one remote directory still to be visited
struct DirCursor {
    remote: String,
    local: PathBuf,
    entries: std::vec::IntoIter<EntryRecord>,
}

pub struct SyncPlanner<'a> {
    device: &'a dyn RemoteDevice,
    executor: TransferExecutor<'a>,
    logger: &'a dyn Logger,
}

impl<'a> SyncPlanner<'a> {
    pub fn new(
        device: &'a dyn RemoteDevice,
        executor: TransferExecutor<'a>,
        logger: &'a dyn Logger,
    ) -> Self {
        Self {
            device,
            executor,
            logger,
        }
    }

    fn open(&self, remote: String, local: PathBuf) -> Result<DirCursor> {
        let entries = read_dir(self.device, &remote, self.logger)?;
        Ok(DirCursor {
            remote,
            local,
            entries: entries.into_iter(),
        })
    }

    /// Sync `remote_root` (trailing `/`) into `local_root`.
    ///
    /// Depth-first in listing order: a subdirectory is finished before the
    /// next sibling of its parent is looked at. Any listing, stat or pull
    /// error aborts the walk.
    pub fn run(&self, remote_root: &str, local_root: &Path) -> Result<SyncTotals> {
        self.logger.start(remote_root, local_root);
        self.executor.ensure_dir(local_root)?;

        let mut totals = SyncTotals::default();
        let mut stack = vec![self.open(remote_root.to_string(), local_root.to_path_buf())?];

        while let Some(cursor) = stack.last_mut() {
            let Some(entry) = cursor.entries.next() else {
                stack.pop();
                continue;
            };
            let target = cursor.local.join(entry.name());

            match classify(&entry, &target)? {
                Decision::Descend => {
                    let remote = child_dir(&cursor.remote, entry.name());
                    self.executor.ensure_dir(&target)?;
                    let next = self.open(remote, target)?;
                    stack.push(next);
                }
                Decision::Skip => {
                    let remote = child_file(&cursor.remote, entry.name());
                    self.logger.up_to_date(&remote, &target);
                    totals.add_file(false);
                }
                Decision::Copy(reason) => {
                    let remote = child_file(&cursor.remote, entry.name());
                    self.logger.copy(&remote, &target, reason);
                    self.executor.execute(&entry, &remote, &target)?;
                    totals.add_file(true);
                }
            }
        }

        Ok(totals)
    }
}
