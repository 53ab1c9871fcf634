use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::logger::Logger;
use crate::planner::CopyReason;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SyncEvent {
    Start,
    Listing,
    SkippedLine,
    Copy,
    UpToDate,
    Error,
    Done,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SyncLogEntry {
    pub timestamp: String,
    pub event: SyncEvent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub considered: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub copied: Option<u64>,
}

impl SyncLogEntry {
    fn new(event: SyncEvent) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event,
            remote: None,
            local: None,
            detail: None,
            considered: None,
            copied: None,
        }
    }
}

/// JSON-lines event log, one object per line
pub struct JsonLogger {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open JSON log file")?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    fn write(&self, entry: &SyncLogEntry) {
        if let Ok(mut f) = self.file.lock() {
            if serde_json::to_writer(&mut *f, entry).is_ok() {
                let _ = f.write_all(b"\n");
            }
        }
    }

    pub fn read_log(&self) -> Result<Vec<SyncLogEntry>> {
        read_log(&self.path)
    }
}

pub fn read_log(path: &Path) -> Result<Vec<SyncLogEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path).context("Failed to open JSON log file for reading")?;
    let reader = BufReader::new(file);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let entry: SyncLogEntry = serde_json::from_str(&line)?;
        entries.push(entry);
    }
    Ok(entries)
}

impl Logger for JsonLogger {
    fn start(&self, remote: &str, local: &Path) {
        let mut e = SyncLogEntry::new(SyncEvent::Start);
        e.remote = Some(remote.to_string());
        e.local = Some(local.to_path_buf());
        self.write(&e);
    }
    fn listing(&self, dir: &str) {
        let mut e = SyncLogEntry::new(SyncEvent::Listing);
        e.remote = Some(dir.to_string());
        self.write(&e);
    }
    fn skipped_line(&self, dir: &str, line: &str, reason: &str) {
        let mut e = SyncLogEntry::new(SyncEvent::SkippedLine);
        e.remote = Some(dir.to_string());
        e.detail = Some(format!("{reason}: {line}"));
        self.write(&e);
    }
    fn copy(&self, remote: &str, local: &Path, reason: CopyReason) {
        let mut e = SyncLogEntry::new(SyncEvent::Copy);
        e.remote = Some(remote.to_string());
        e.local = Some(local.to_path_buf());
        e.detail = Some(reason.as_str().to_string());
        self.write(&e);
    }
    fn up_to_date(&self, remote: &str, local: &Path) {
        let mut e = SyncLogEntry::new(SyncEvent::UpToDate);
        e.remote = Some(remote.to_string());
        e.local = Some(local.to_path_buf());
        self.write(&e);
    }
    fn error(&self, context: &str, path: &str, msg: &str) {
        let mut e = SyncLogEntry::new(SyncEvent::Error);
        e.remote = Some(path.to_string());
        e.detail = Some(format!("{context}: {msg}"));
        self.write(&e);
    }
    fn done(&self, considered: u64, copied: u64, _seconds: f64) {
        let mut e = SyncLogEntry::new(SyncEvent::Done);
        e.considered = Some(considered);
        e.copied = Some(copied);
        self.write(&e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_read_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let logger = JsonLogger::new(dir.path().join("events.jsonl")).unwrap();
        logger.start("/sdcard/", Path::new("/backup/"));
        logger.copy("/sdcard/a.txt", Path::new("/backup/a.txt"), CopyReason::SizeChanged);
        logger.done(4, 1, 1.0);

        let entries = logger.read_log().unwrap();
        let events: Vec<_> = entries.iter().map(|e| e.event.clone()).collect();
        assert_eq!(events, vec![SyncEvent::Start, SyncEvent::Copy, SyncEvent::Done]);
        assert_eq!(entries[1].detail.as_deref(), Some("size_changed"));
        assert_eq!(entries[2].considered, Some(4));
        assert_eq!(entries[2].copied, Some(1));
    }

    #[test]
    fn missing_log_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_log(&dir.path().join("absent.jsonl")).unwrap().is_empty());
    }
}
