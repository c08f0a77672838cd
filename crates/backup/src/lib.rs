//! Save backup snapshots.
//!
//! Before a sync overwrites one side, that side's files are copied into a
//! brand-new folder:
//!
//! ```text
//! <backupRoot>/<gameName>/<side>_<YYYYMMDD_HHmmss>/<original file names>
//! ```
//!
//! A snapshot directory is never reused. Two snapshots in the same second
//! get `-2`, `-3`, … suffixes. Snapshots are never pruned.

mod checksum;
mod snapshot;
mod source;

pub use checksum::file_checksum;
pub use snapshot::{BackupFile, BackupSnapshot, BackupStore, Side, SnapshotInfo};
pub use source::{LocalDirSource, SnapshotSource, validate_file_name};

/// Errors produced while writing or listing snapshots.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid file name: {0}")]
    InvalidName(String),

    #[error("snapshot source failed: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("could not allocate a snapshot directory under {0}")]
    Exhausted(String),
}
