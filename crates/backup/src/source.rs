//! Where snapshot content comes from.

use std::path::{Path, PathBuf};

use crate::BackupError;

/// A flat set of named files that can be copied into a snapshot.
///
/// Implemented for local directories here; the sync engine implements it
/// for device folders.
pub trait SnapshotSource {
    /// Names of the files to back up (no directories, no separators).
    fn file_names(&self) -> Result<Vec<String>, BackupError>;

    /// Copies file `name` to `dest`, which does not exist yet.
    fn copy_to(&self, name: &str, dest: &Path) -> Result<(), BackupError>;
}

/// Files directly inside a local directory. Sub-directories are ignored.
#[derive(Debug, Clone)]
pub struct LocalDirSource {
    dir: PathBuf,
}

impl LocalDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl SnapshotSource for LocalDirSource {
    fn file_names(&self) -> Result<Vec<String>, BackupError> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn copy_to(&self, name: &str, dest: &Path) -> Result<(), BackupError> {
        std::fs::copy(self.dir.join(name), dest)?;
        Ok(())
    }
}

/// Rejects names that are empty, relative markers, or contain separators.
pub fn validate_file_name(name: &str) -> Result<(), BackupError> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(BackupError::InvalidName(name.to_string()));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(BackupError::InvalidName(name.to_string()));
    }
    Ok(())
}
