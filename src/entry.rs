//! Remote directory entries as reported by the device listing

use chrono::{Local, NaiveDateTime, TimeZone};

/// Type of a remote entry, taken from the first permissions character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    RegularFile,
    Directory,
    /// Symlinks, devices, sockets, pipes. Never synced.
    Other,
}

impl EntryKind {
    pub fn from_permissions(permissions: &str) -> Self {
        match permissions.as_bytes().first() {
            Some(b'-') => EntryKind::RegularFile,
            Some(b'd') => EntryKind::Directory,
            _ => EntryKind::Other,
        }
    }
}

/// One child of a remote directory.
///
/// Records are only built by the listing parser, which guarantees that
/// `size` is present exactly for regular files and that `name` is a bare
/// base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    pub(crate) permissions: String,
    pub(crate) owner: String,
    pub(crate) group: String,
    pub(crate) size: Option<u64>,
    pub(crate) modified_at: NaiveDateTime,
    pub(crate) name: String,
}

impl EntryRecord {
    pub fn permissions(&self) -> &str {
        &self.permissions
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    /// Byte count; `None` for directories
    pub fn size(&self) -> Option<u64> {
        self.size
    }

    /// Device wall-clock modification time, minute precision
    pub fn modified_at(&self) -> NaiveDateTime {
        self.modified_at
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntryKind {
        EntryKind::from_permissions(&self.permissions)
    }

    pub fn is_directory(&self) -> bool {
        self.kind() == EntryKind::Directory
    }

    /// Modification time as Unix seconds.
    ///
    /// The listing carries no zone, so the timestamp is read as host local
    /// time. Nonexistent local times (DST gaps) fall back to UTC.
    pub fn modified_epoch(&self) -> i64 {
        local_epoch(&self.modified_at)
    }
}

/// Convert a naive wall-clock time to Unix seconds in the host time zone
pub fn local_epoch(naive: &NaiveDateTime) -> i64 {
    Local
        .from_local_datetime(naive)
        .earliest()
        .map(|dt| dt.timestamp())
        .unwrap_or_else(|| naive.and_utc().timestamp())
}
