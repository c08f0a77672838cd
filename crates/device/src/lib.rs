//! Portable storage device access for CrosSave.
//!
//! The sync engine never talks to MTP directly. It consumes the [`Device`]
//! capability set defined here, which the front-end backs with whatever
//! device layer is available. This crate ships one concrete adapter,
//! [`FsDevice`], that serves a device from a mounted directory (an MTP
//! mount point, or a fixture tree in tests).
//!
//! Connections are scoped per logical operation: open one with
//! [`Connection::open`] and let it drop to disconnect.

mod connection;
mod error;
mod fs_device;
mod path;
mod retry;

use std::path::Path;

pub use connection::{Connection, find_device, find_switch};
pub use error::DeviceError;
pub use fs_device::{FsDevice, FsDeviceProvider, default_mount_roots};
pub use path::DevicePath;
pub use retry::RetryConfig;

/// Substring that identifies a Switch in a device's display name.
pub const SWITCH_DEVICE_NAME: &str = "Switch";

/// A portable storage device addressed by [`DevicePath`]s.
///
/// Every operation except [`connect`](Device::connect) requires an open
/// connection. Uploading onto an existing file fails with
/// [`DeviceError::AlreadyExists`]; callers delete first.
pub trait Device: Send {
    /// Display name reported by the device.
    fn name(&self) -> &str;

    fn connect(&mut self) -> Result<(), DeviceError>;

    fn disconnect(&mut self) -> Result<(), DeviceError>;

    fn is_connected(&self) -> bool;

    fn directory_exists(&self, path: &DevicePath) -> Result<bool, DeviceError>;

    /// Returns the full paths of the sub-directories of `path`.
    fn get_directories(&self, path: &DevicePath) -> Result<Vec<DevicePath>, DeviceError>;

    /// Returns the full paths of the files directly inside `path`.
    fn get_files(&self, path: &DevicePath) -> Result<Vec<DevicePath>, DeviceError>;

    fn file_exists(&self, path: &DevicePath) -> Result<bool, DeviceError>;

    fn delete_file(&mut self, path: &DevicePath) -> Result<(), DeviceError>;

    /// Copies a device file to `local`, replacing any existing local file.
    fn download_file(&self, remote: &DevicePath, local: &Path) -> Result<(), DeviceError>;

    /// Copies a local file to `remote`. The destination must not exist.
    fn upload_file(&mut self, local: &Path, remote: &DevicePath) -> Result<(), DeviceError>;
}

/// Enumerates the devices currently attached.
pub trait DeviceProvider: Send + Sync {
    fn list_devices(&self) -> Result<Vec<Box<dyn Device>>, DeviceError>;
}
