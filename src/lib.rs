//! adbsync library
//!
//! One-way, incremental sync of a directory tree from an Android device to
//! the local filesystem. Files are copied when missing locally or when their
//! size or modification minute differs; copies get the device mtime.

pub mod cli;
pub mod config;
pub mod entry;
pub mod listing;
pub mod log;
pub mod logger;
pub mod planner;
pub mod progress;
pub mod remote;
pub mod transfer;
pub mod url;

pub use cli::{Args, Settings};
pub use entry::{EntryKind, EntryRecord};
pub use planner::{classify, CopyReason, Decision, SyncPlanner, SyncTotals};
pub use remote::{AdbDevice, RemoteDevice};
pub use transfer::TransferExecutor;
