//! Sync error types.

use crossave_backup::BackupError;
use crossave_device::DeviceError;
use crossave_patch::PatchError;

/// Errors produced by a pull or push.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("configuration invalid: {0}")]
    ConfigInvalid(String),

    #[error("Switch not found")]
    DeviceNotFound,

    #[error("path does not exist: {0}")]
    PathNotFound(String),

    #[error("device transfer failed: {0}")]
    Device(#[from] DeviceError),

    #[error("local I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("patch failed: {0}")]
    Patch(#[from] PatchError),

    #[error("backup failed: {0}")]
    Backup(#[from] BackupError),

    #[error("cancelled")]
    Cancelled,

    #[error("a sync is already running")]
    Busy,

    #[error("sync worker failed: {0}")]
    Worker(String),
}

/// Coarse classification of a [`SyncError`] for callers that branch on
/// the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncErrorKind {
    ConfigInvalid,
    DeviceNotFound,
    PathNotFound,
    TransferFailed,
    PatchFailed,
    Backup,
    Cancelled,
    Busy,
}

impl SyncError {
    pub fn kind(&self) -> SyncErrorKind {
        match self {
            SyncError::ConfigInvalid(_) => SyncErrorKind::ConfigInvalid,
            SyncError::DeviceNotFound => SyncErrorKind::DeviceNotFound,
            SyncError::PathNotFound(_) => SyncErrorKind::PathNotFound,
            SyncError::Device(_) | SyncError::Io(_) | SyncError::Worker(_) => {
                SyncErrorKind::TransferFailed
            }
            SyncError::Patch(_) => SyncErrorKind::PatchFailed,
            SyncError::Backup(_) => SyncErrorKind::Backup,
            SyncError::Cancelled => SyncErrorKind::Cancelled,
            SyncError::Busy => SyncErrorKind::Busy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(
            SyncError::ConfigInvalid("x".into()).kind(),
            SyncErrorKind::ConfigInvalid
        );
        assert_eq!(SyncError::DeviceNotFound.kind(), SyncErrorKind::DeviceNotFound);
        assert_eq!(
            SyncError::from(DeviceError::NotConnected("Switch".into())).kind(),
            SyncErrorKind::TransferFailed
        );
        assert_eq!(
            SyncError::from(std::io::Error::other("disk")).kind(),
            SyncErrorKind::TransferFailed
        );
        assert_eq!(
            SyncError::from(PatchError::TooShort {
                file: "f".into(),
                len: 3,
                offset: 4
            })
            .kind(),
            SyncErrorKind::PatchFailed
        );
        assert_eq!(SyncError::Cancelled.kind(), SyncErrorKind::Cancelled);
    }

    #[test]
    fn messages_are_single_line() {
        let err = SyncError::PathNotFound("7: Saves\\Installed games\\Game\\alice".into());
        assert!(!err.to_string().contains('\n'));
        assert_eq!(SyncError::DeviceNotFound.to_string(), "Switch not found");
    }
}
