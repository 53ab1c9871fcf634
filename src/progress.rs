//! Console reporting
//!
//! A spinner on stderr shows which remote directory is being listed while
//! per-file lines scroll above it on stdout. When stderr is not a terminal
//! indicatif hides the spinner and only the plain lines remain. Fatal errors
//! are left to `main`, which prints them once on exit.

use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::logger::Logger;
use crate::planner::CopyReason;

pub struct ConsoleReporter {
    spinner: ProgressBar,
    verbose: bool,
    dry_run: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool, dry_run: bool) -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "),
        );
        spinner.enable_steady_tick(Duration::from_millis(120));
        Self {
            spinner,
            verbose,
            dry_run,
        }
    }

    /// Stop the spinner and clear its line
    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }

    fn print(&self, line: String) {
        self.spinner.suspend(|| println!("{line}"));
    }
}

impl Logger for ConsoleReporter {
    fn listing(&self, dir: &str) {
        self.spinner.set_message(format!("listing {dir}"));
    }

    fn skipped_line(&self, dir: &str, line: &str, reason: &str) {
        if is_total_header(line) {
            return;
        }
        let msg = if self.verbose {
            format!("No match on line in {dir} ({reason}): {line:?}")
        } else {
            format!("No match on line in {dir}: {line:?}")
        };
        self.spinner.suspend(|| eprintln!("{msg}"));
    }

    fn copy(&self, remote: &str, _local: &Path, reason: CopyReason) {
        let line = if self.verbose {
            format!("{remote}... ({})", reason.as_str())
        } else {
            format!("{remote}...")
        };
        if self.dry_run {
            self.print(format!("would copy {line}"));
        } else {
            self.print(line);
        }
    }

    fn up_to_date(&self, remote: &str, _local: &Path) {
        if self.verbose {
            self.print(format!("{remote} up to date"));
        }
    }
}

/// The `total N` block count `ls -l` prints before the entries
pub fn is_total_header(line: &str) -> bool {
    let mut parts = line.split_whitespace();
    parts.next() == Some("total")
        && parts.next().is_some_and(|n| n.bytes().all(|b| b.is_ascii_digit()))
        && parts.next().is_none()
}

impl Drop for ConsoleReporter {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_header_is_recognised() {
        assert!(is_total_header("total 24"));
        assert!(is_total_header("total 0"));
        assert!(!is_total_header("total"));
        assert!(!is_total_header("total 24 extra"));
        assert!(!is_total_header("totals 24"));
        assert!(!is_total_header("lrwxrwxrwx 1 root root 21 2020-01-01 10:00 link -> a.txt"));
    }

    #[test]
    fn reporter_accepts_events_without_a_terminal() {
        let reporter = ConsoleReporter::new(false, true);
        reporter.listing("/sdcard/");
        reporter.skipped_line("/sdcard/", "total 8", "permissions field too short");
        reporter.copy("/sdcard/a.txt", Path::new("a.txt"), CopyReason::Missing);
        reporter.finish();
    }
}
