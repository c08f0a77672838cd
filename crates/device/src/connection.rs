//! Device selection and the scoped connection guard.

use std::ops::{Deref, DerefMut};

use tracing::{debug, warn};

use crate::{Device, DeviceError, DeviceProvider, RetryConfig, SWITCH_DEVICE_NAME};

/// An open device connection, disconnected on drop.
///
/// Holding the guard is the only way the engine touches a device, so every
/// exit path (success, `?`, panic unwinding) releases the device.
pub struct Connection<'a> {
    device: &'a mut dyn Device,
}

impl<'a> Connection<'a> {
    /// Connects `device`, retrying transient failures per `retry`.
    pub fn open(device: &'a mut dyn Device, retry: &RetryConfig) -> Result<Self, DeviceError> {
        retry.run("connect", || device.connect())?;
        Ok(Self { device })
    }
}

impl<'a> Deref for Connection<'a> {
    type Target = dyn Device + 'a;

    fn deref(&self) -> &Self::Target {
        self.device
    }
}

impl DerefMut for Connection<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.device
    }
}

impl Drop for Connection<'_> {
    fn drop(&mut self) {
        if !self.device.is_connected() {
            return;
        }
        match self.device.disconnect() {
            Ok(()) => debug!(device = %self.device.name(), "connection released"),
            Err(e) => warn!(device = %self.device.name(), error = %e, "disconnect failed"),
        }
    }
}

/// Returns the first device whose name contains `needle`, ignoring case.
///
/// No match is `Ok(None)`, not an error.
pub fn find_device(
    provider: &dyn DeviceProvider,
    needle: &str,
) -> Result<Option<Box<dyn Device>>, DeviceError> {
    let needle = needle.to_lowercase();
    let device = provider
        .list_devices()?
        .into_iter()
        .find(|d| d.name().to_lowercase().contains(&needle));
    if device.is_none() {
        debug!(needle = %needle, "no matching device attached");
    }
    Ok(device)
}

/// Returns the first attached Switch.
pub fn find_switch(provider: &dyn DeviceProvider) -> Result<Option<Box<dyn Device>>, DeviceError> {
    find_device(provider, SWITCH_DEVICE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DevicePath, FsDevice, FsDeviceProvider};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts disconnects so tests can assert the guard fired.
    struct CountingDevice {
        inner: FsDevice,
        disconnects: Arc<AtomicUsize>,
    }

    impl Device for CountingDevice {
        fn name(&self) -> &str {
            self.inner.name()
        }
        fn connect(&mut self) -> Result<(), DeviceError> {
            self.inner.connect()
        }
        fn disconnect(&mut self) -> Result<(), DeviceError> {
            self.disconnects.fetch_add(1, Ordering::SeqCst);
            self.inner.disconnect()
        }
        fn is_connected(&self) -> bool {
            self.inner.is_connected()
        }
        fn directory_exists(&self, path: &DevicePath) -> Result<bool, DeviceError> {
            self.inner.directory_exists(path)
        }
        fn get_directories(&self, path: &DevicePath) -> Result<Vec<DevicePath>, DeviceError> {
            self.inner.get_directories(path)
        }
        fn get_files(&self, path: &DevicePath) -> Result<Vec<DevicePath>, DeviceError> {
            self.inner.get_files(path)
        }
        fn file_exists(&self, path: &DevicePath) -> Result<bool, DeviceError> {
            self.inner.file_exists(path)
        }
        fn delete_file(&mut self, path: &DevicePath) -> Result<(), DeviceError> {
            self.inner.delete_file(path)
        }
        fn download_file(
            &self,
            remote: &DevicePath,
            local: &std::path::Path,
        ) -> Result<(), DeviceError> {
            self.inner.download_file(remote, local)
        }
        fn upload_file(
            &mut self,
            local: &std::path::Path,
            remote: &DevicePath,
        ) -> Result<(), DeviceError> {
            self.inner.upload_file(local, remote)
        }
    }

    fn fails_midway(conn: &Connection<'_>) -> Result<(), DeviceError> {
        conn.get_files(&DevicePath::new("missing"))?;
        Ok(())
    }

    #[test]
    fn guard_disconnects_on_error_path() {
        let tmp = tempfile::tempdir().unwrap();
        let disconnects = Arc::new(AtomicUsize::new(0));
        let mut dev = CountingDevice {
            inner: FsDevice::new("Switch", tmp.path()),
            disconnects: disconnects.clone(),
        };

        {
            let conn = Connection::open(&mut dev, &RetryConfig::none()).unwrap();
            assert!(conn.is_connected());
            assert!(fails_midway(&conn).is_err());
        }

        assert_eq!(disconnects.load(Ordering::SeqCst), 1);
        assert!(!dev.is_connected());
    }

    #[test]
    fn failed_connect_has_nothing_to_release() {
        let disconnects = Arc::new(AtomicUsize::new(0));
        let mut dev = CountingDevice {
            inner: FsDevice::new("Switch", "/nonexistent/crossave"),
            disconnects: disconnects.clone(),
        };
        assert!(Connection::open(&mut dev, &RetryConfig::none()).is_err());
        assert_eq!(disconnects.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn find_switch_is_case_insensitive() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("Camera")).unwrap();
        std::fs::create_dir_all(tmp.path().join("nintendo SWITCH")).unwrap();

        let provider = FsDeviceProvider::new(vec![tmp.path().to_path_buf()]);
        let dev = find_switch(&provider).unwrap().unwrap();
        assert_eq!(dev.name(), "nintendo SWITCH");
    }

    #[test]
    fn find_switch_absent_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("Camera")).unwrap();

        let provider = FsDeviceProvider::new(vec![tmp.path().to_path_buf()]);
        assert!(find_switch(&provider).unwrap().is_none());
    }
}
