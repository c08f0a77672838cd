//! Device folders as backup sources.

use std::path::Path;

use crossave_backup::{BackupError, SnapshotSource};
use crossave_device::{Device, DevicePath};

/// Files directly inside one folder of a connected device.
///
/// Downloads are not retried: a failed backup fails the whole sync.
pub(crate) struct DeviceDirSource<'a> {
    device: &'a dyn Device,
    dir: DevicePath,
}

impl<'a> DeviceDirSource<'a> {
    pub(crate) fn new(device: &'a dyn Device, dir: DevicePath) -> Self {
        Self { device, dir }
    }
}

impl SnapshotSource for DeviceDirSource<'_> {
    fn file_names(&self) -> Result<Vec<String>, BackupError> {
        let files = self
            .device
            .get_files(&self.dir)
            .map_err(|e| BackupError::Source(Box::new(e)))?;
        Ok(files
            .iter()
            .filter_map(|f| f.file_name().map(str::to_string))
            .collect())
    }

    fn copy_to(&self, name: &str, dest: &Path) -> Result<(), BackupError> {
        self.device
            .download_file(&self.dir.join(name), dest)
            .map_err(|e| BackupError::Source(Box::new(e)))
    }
}
