use anyhow::Result;
use chrono::Utc;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::planner::CopyReason;

pub trait Logger: Send + Sync {
    fn start(&self, _remote: &str, _local: &Path) {}
    fn listing(&self, _dir: &str) {}
    fn skipped_line(&self, _dir: &str, _line: &str, _reason: &str) {}
    fn copy(&self, _remote: &str, _local: &Path, _reason: CopyReason) {}
    fn up_to_date(&self, _remote: &str, _local: &Path) {}
    fn error(&self, _context: &str, _path: &str, _msg: &str) {}
    fn done(&self, _considered: u64, _copied: u64, _seconds: f64) {}
}

pub struct NoopLogger;
impl Logger for NoopLogger {}

pub struct TextLogger {
    file: Mutex<File>,
}

impl TextLogger {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let f = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(f),
        })
    }

    fn line(&self, s: &str) {
        if let Ok(mut f) = self.file.lock() {
            let _ = writeln!(f, "[{}] {}", Utc::now().to_rfc3339(), s);
        }
    }
}

impl Logger for TextLogger {
    fn start(&self, remote: &str, local: &Path) {
        self.line(&format!("START remote={} local={}", remote, local.display()));
    }
    fn listing(&self, dir: &str) {
        self.line(&format!("LIST dir={dir}"));
    }
    fn skipped_line(&self, dir: &str, line: &str, reason: &str) {
        self.line(&format!("SKIPLINE dir={dir} reason={reason} line={line:?}"));
    }
    fn copy(&self, remote: &str, local: &Path, reason: CopyReason) {
        self.line(&format!(
            "COPY remote={} local={} reason={}",
            remote,
            local.display(),
            reason.as_str()
        ));
    }
    fn up_to_date(&self, remote: &str, local: &Path) {
        self.line(&format!("UPTODATE remote={} local={}", remote, local.display()));
    }
    fn error(&self, context: &str, path: &str, msg: &str) {
        self.line(&format!("ERROR ctx={context} path={path} msg={msg}"));
    }
    fn done(&self, considered: u64, copied: u64, seconds: f64) {
        self.line(&format!(
            "DONE considered={considered} copied={copied} seconds={seconds:.3}"
        ));
    }
}

/// Forwards every event to each inner logger in order
#[derive(Default)]
pub struct FanoutLogger {
    inner: Vec<Arc<dyn Logger>>,
}

impl FanoutLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, logger: Arc<dyn Logger>) {
        self.inner.push(logger);
    }
}

impl Logger for FanoutLogger {
    fn start(&self, remote: &str, local: &Path) {
        self.inner.iter().for_each(|l| l.start(remote, local));
    }
    fn listing(&self, dir: &str) {
        self.inner.iter().for_each(|l| l.listing(dir));
    }
    fn skipped_line(&self, dir: &str, line: &str, reason: &str) {
        self.inner.iter().for_each(|l| l.skipped_line(dir, line, reason));
    }
    fn copy(&self, remote: &str, local: &Path, reason: CopyReason) {
        self.inner.iter().for_each(|l| l.copy(remote, local, reason));
    }
    fn up_to_date(&self, remote: &str, local: &Path) {
        self.inner.iter().for_each(|l| l.up_to_date(remote, local));
    }
    fn error(&self, context: &str, path: &str, msg: &str) {
        self.inner.iter().for_each(|l| l.error(context, path, msg));
    }
    fn done(&self, considered: u64, copied: u64, seconds: f64) {
        self.inner.iter().for_each(|l| l.done(considered, copied, seconds));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_logger_appends_timestamped_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/sync.log");
        {
            let logger = TextLogger::new(&path).unwrap();
            logger.listing("/sdcard/");
            logger.copy("/sdcard/a.txt", Path::new("/tmp/a.txt"), CopyReason::Missing);
            logger.done(3, 1, 0.5);
        }
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.starts_with('[')));
        assert!(lines[0].ends_with("LIST dir=/sdcard/"));
        assert!(lines[1].contains("COPY remote=/sdcard/a.txt"));
        assert!(lines[1].ends_with("reason=missing"));
        assert!(lines[2].ends_with("DONE considered=3 copied=1 seconds=0.500"));
    }

    #[test]
    fn fanout_reaches_every_logger() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.log");
        let b = dir.path().join("b.log");
        let mut fan = FanoutLogger::new();
        fan.push(Arc::new(TextLogger::new(&a).unwrap()));
        fan.push(Arc::new(TextLogger::new(&b).unwrap()));
        fan.error("pull", "/sdcard/x", "boom");
        drop(fan);
        for p in [a, b] {
            let text = std::fs::read_to_string(p).unwrap();
            assert!(text.contains("ERROR ctx=pull path=/sdcard/x msg=boom"));
        }
    }
}
