//! Device adapter over a mounted directory tree.
//!
//! MTP stacks such as GVFS or jmtpfs expose an attached device as a
//! directory whose children are the device's storages. [`FsDevice`] serves
//! the [`Device`] contract from such a directory, with MTP's rules: no
//! implicit directory creation and no upload over an existing file.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::{Device, DeviceError, DevicePath, DeviceProvider};

/// Environment variable holding the mount roots scanned for devices.
pub const DEVICE_ROOTS_ENV: &str = "CROSSAVE_DEVICE_ROOTS";

/// A device whose storage is a local directory.
#[derive(Debug)]
pub struct FsDevice {
    name: String,
    root: PathBuf,
    connected: bool,
}

impl FsDevice {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            connected: false,
        }
    }

    /// Root directory backing this device.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_connected(&self) -> Result<(), DeviceError> {
        if self.connected {
            Ok(())
        } else {
            Err(DeviceError::NotConnected(self.name.clone()))
        }
    }

    /// Maps a device path onto the backing directory.
    ///
    /// Rejects components that would leave the root.
    fn resolve(&self, path: &DevicePath) -> Result<PathBuf, DeviceError> {
        self.ensure_connected()?;
        let mut resolved = self.root.clone();
        for component in path.components() {
            if component == ".." || component == "." || component.contains('\0') {
                return Err(DeviceError::InvalidPath(path.to_string()));
            }
            resolved.push(component);
        }
        Ok(resolved)
    }

    fn list(&self, path: &DevicePath, want_dirs: bool) -> Result<Vec<DevicePath>, DeviceError> {
        let dir = self.resolve(path)?;
        if !dir.is_dir() {
            return Err(DeviceError::NotFound(path.to_string()));
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            let matches = if want_dirs {
                file_type.is_dir()
            } else {
                file_type.is_file()
            };
            if matches {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();

        Ok(names.iter().map(|n| path.join(n)).collect())
    }
}

impl Device for FsDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn connect(&mut self) -> Result<(), DeviceError> {
        if !self.root.is_dir() {
            return Err(DeviceError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("device root missing: {}", self.root.display()),
            )));
        }
        self.connected = true;
        debug!(device = %self.name, root = %self.root.display(), "connected");
        Ok(())
    }

    fn disconnect(&mut self) -> Result<(), DeviceError> {
        self.connected = false;
        debug!(device = %self.name, "disconnected");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn directory_exists(&self, path: &DevicePath) -> Result<bool, DeviceError> {
        Ok(self.resolve(path)?.is_dir())
    }

    fn get_directories(&self, path: &DevicePath) -> Result<Vec<DevicePath>, DeviceError> {
        self.list(path, true)
    }

    fn get_files(&self, path: &DevicePath) -> Result<Vec<DevicePath>, DeviceError> {
        self.list(path, false)
    }

    fn file_exists(&self, path: &DevicePath) -> Result<bool, DeviceError> {
        Ok(self.resolve(path)?.is_file())
    }

    fn delete_file(&mut self, path: &DevicePath) -> Result<(), DeviceError> {
        let target = self.resolve(path)?;
        if !target.is_file() {
            return Err(DeviceError::NotFound(path.to_string()));
        }
        std::fs::remove_file(&target)?;
        trace!(device = %self.name, path = %path, "deleted");
        Ok(())
    }

    fn download_file(&self, remote: &DevicePath, local: &Path) -> Result<(), DeviceError> {
        let source = self.resolve(remote)?;
        if !source.is_file() {
            return Err(DeviceError::NotFound(remote.to_string()));
        }
        std::fs::copy(&source, local)?;
        trace!(device = %self.name, remote = %remote, local = %local.display(), "downloaded");
        Ok(())
    }

    fn upload_file(&mut self, local: &Path, remote: &DevicePath) -> Result<(), DeviceError> {
        let target = self.resolve(remote)?;
        if target.exists() {
            return Err(DeviceError::AlreadyExists(remote.to_string()));
        }
        let parent_exists = target.parent().is_some_and(Path::is_dir);
        if !parent_exists {
            let parent = remote.parent().unwrap_or_default();
            return Err(DeviceError::NotFound(parent.to_string()));
        }
        std::fs::copy(local, &target)?;
        trace!(device = %self.name, local = %local.display(), remote = %remote, "uploaded");
        Ok(())
    }
}

/// Lists every sub-directory of the configured mount roots as a device.
#[derive(Debug, Clone, Default)]
pub struct FsDeviceProvider {
    roots: Vec<PathBuf>,
}

impl FsDeviceProvider {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Builds a provider from [`DEVICE_ROOTS_ENV`], falling back to
    /// [`default_mount_roots`].
    pub fn from_env() -> Self {
        let roots = match std::env::var_os(DEVICE_ROOTS_ENV) {
            Some(value) => std::env::split_paths(&value).collect(),
            None => default_mount_roots(),
        };
        Self::new(roots)
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl DeviceProvider for FsDeviceProvider {
    fn list_devices(&self) -> Result<Vec<Box<dyn Device>>, DeviceError> {
        let mut devices: Vec<Box<dyn Device>> = Vec::new();
        for root in &self.roots {
            let entries = match std::fs::read_dir(root) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(root = %root.display(), "mount root missing, skipping");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let mut found = Vec::new();
            for entry in entries {
                let entry = entry?;
                if entry.file_type()?.is_dir() {
                    let name = entry.file_name().to_string_lossy().into_owned();
                    found.push(FsDevice::new(name, entry.path()));
                }
            }
            found.sort_by(|a, b| a.name.cmp(&b.name));
            devices.extend(found.into_iter().map(|d| Box::new(d) as Box<dyn Device>));
        }
        Ok(devices)
    }
}

/// Platform default directories where MTP devices get mounted.
pub fn default_mount_roots() -> Vec<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        std::env::var_os("XDG_RUNTIME_DIR")
            .map(|dir| vec![PathBuf::from(dir).join("gvfs")])
            .unwrap_or_default()
    }

    #[cfg(not(target_os = "linux"))]
    {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn device_with_tree() -> (TempDir, FsDevice) {
        let tmp = TempDir::new().unwrap();
        let saves = tmp.path().join("7: Saves").join("Installed games").join("Game");
        fs::create_dir_all(saves.join("alice")).unwrap();
        fs::write(saves.join("alice").join("save1"), b"SAVE").unwrap();
        fs::write(saves.join("alice").join("save2"), b"SAVE2").unwrap();
        fs::create_dir_all(saves.join("alice").join("nested")).unwrap();

        let mut dev = FsDevice::new("Nintendo Switch", tmp.path());
        dev.connect().unwrap();
        (tmp, dev)
    }

    #[test]
    fn operations_require_connection() {
        let tmp = TempDir::new().unwrap();
        let dev = FsDevice::new("Switch", tmp.path());
        let err = dev.directory_exists(&DevicePath::new("x")).unwrap_err();
        assert!(matches!(err, DeviceError::NotConnected(_)));
    }

    #[test]
    fn connect_fails_for_missing_root() {
        let mut dev = FsDevice::new("Switch", "/nonexistent/crossave/device");
        assert!(dev.connect().is_err());
        assert!(!dev.is_connected());
    }

    #[test]
    fn lists_files_and_directories_separately() {
        let (_tmp, dev) = device_with_tree();
        let path = DevicePath::new("7: Saves\\Installed games\\Game\\alice");

        let files = dev.get_files(&path).unwrap();
        let names: Vec<_> = files.iter().filter_map(|p| p.file_name()).collect();
        assert_eq!(names, vec!["save1", "save2"]);

        let dirs = dev.get_directories(&path).unwrap();
        assert_eq!(dirs, vec![path.join("nested")]);
    }

    #[test]
    fn listing_missing_directory_is_not_found() {
        let (_tmp, dev) = device_with_tree();
        let err = dev.get_files(&DevicePath::new("7: Saves/Nope")).unwrap_err();
        assert!(matches!(err, DeviceError::NotFound(_)));
    }

    #[test]
    fn upload_refuses_existing_file() {
        let (tmp, mut dev) = device_with_tree();
        let local = tmp.path().join("local.bin");
        fs::write(&local, b"NEW").unwrap();

        let remote = DevicePath::new("7: Saves/Installed games/Game/alice/save1");
        let err = dev.upload_file(&local, &remote).unwrap_err();
        assert!(matches!(err, DeviceError::AlreadyExists(_)));

        dev.delete_file(&remote).unwrap();
        dev.upload_file(&local, &remote).unwrap();
        assert!(dev.file_exists(&remote).unwrap());
    }

    #[test]
    fn upload_requires_parent_directory() {
        let (tmp, mut dev) = device_with_tree();
        let local = tmp.path().join("local.bin");
        fs::write(&local, b"NEW").unwrap();

        let err = dev
            .upload_file(&local, &DevicePath::new("7: Saves/Missing/file"))
            .unwrap_err();
        assert!(matches!(err, DeviceError::NotFound(_)));
    }

    #[test]
    fn download_copies_content() {
        let (_tmp, dev) = device_with_tree();
        let out = TempDir::new().unwrap();
        let dest = out.path().join("save1");
        dev.download_file(
            &DevicePath::new("7: Saves/Installed games/Game/alice/save1"),
            &dest,
        )
        .unwrap();
        assert_eq!(fs::read(dest).unwrap(), b"SAVE");
    }

    #[test]
    fn parent_traversal_rejected() {
        let (_tmp, dev) = device_with_tree();
        let err = dev.file_exists(&DevicePath::new("7: Saves/../../etc")).unwrap_err();
        assert!(matches!(err, DeviceError::InvalidPath(_)));
    }

    #[test]
    fn provider_lists_mounted_devices() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("mtp:host=Nintendo_Switch_1234")).unwrap();
        fs::create_dir_all(tmp.path().join("mtp:host=Camera")).unwrap();
        fs::write(tmp.path().join("not-a-device"), b"").unwrap();

        let provider = FsDeviceProvider::new(vec![
            tmp.path().to_path_buf(),
            PathBuf::from("/nonexistent/crossave/mounts"),
        ]);
        let devices = provider.list_devices().unwrap();
        let names: Vec<_> = devices.iter().map(|d| d.name().to_string()).collect();
        assert_eq!(
            names,
            vec!["mtp:host=Camera", "mtp:host=Nintendo_Switch_1234"]
        );
    }
}
