//! Device error types.

/// Errors produced by device access.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("device not connected: {0}")]
    NotConnected(String),

    #[error("path not found on device: {0}")]
    NotFound(String),

    #[error("file already exists on device: {0}")]
    AlreadyExists(String),

    #[error("invalid device path: {0}")]
    InvalidPath(String),
}

impl DeviceError {
    /// Returns `true` for failures worth retrying (raw I/O hiccups).
    ///
    /// Missing paths, bad paths and state errors are deterministic.
    pub fn is_transient(&self) -> bool {
        match self {
            DeviceError::Io(e) => !matches!(
                e.kind(),
                std::io::ErrorKind::NotFound
                    | std::io::ErrorKind::PermissionDenied
                    | std::io::ErrorKind::AlreadyExists
            ),
            _ => false,
        }
    }
}
