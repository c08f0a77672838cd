use std::path::{Path, PathBuf};

use crate::SettingsError;

/// Overrides the local data directory.
pub const DATA_DIR_ENV: &str = "CROSSAVE_DATA_DIR";

const APP_DIR: &str = "CrosSave";
const BACKUP_DIR: &str = "CrosSaveBackups";
const CATALOG_FILE: &str = "game_data.json";
const SETTINGS_FILE: &str = "settings.json";

/// Resolved on-disk locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    base: PathBuf,
}

impl AppPaths {
    /// Uses [`DATA_DIR_ENV`] if set, else the platform local data directory.
    pub fn new() -> Result<Self, SettingsError> {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            return Ok(Self::with_base(dir));
        }
        local_data_dir()
            .map(Self::with_base)
            .ok_or(SettingsError::NoDataDir)
    }

    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn catalog_file(&self) -> PathBuf {
        self.base.join(APP_DIR).join(CATALOG_FILE)
    }

    pub fn settings_file(&self) -> PathBuf {
        self.base.join(APP_DIR).join(SETTINGS_FILE)
    }

    /// Root of `<gameName>/<side>_<timestamp>` snapshot folders.
    pub fn backup_root(&self) -> PathBuf {
        self.base.join(BACKUP_DIR)
    }
}

/// Platform local (non-roaming) data directory.
fn local_data_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("LOCALAPPDATA").map(PathBuf::from)
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| PathBuf::from(h).join("Library/Application Support"))
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        std::env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".local/share")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_under_base() {
        let paths = AppPaths::with_base("/data");
        assert_eq!(
            paths.catalog_file(),
            PathBuf::from("/data/CrosSave/game_data.json")
        );
        assert_eq!(
            paths.settings_file(),
            PathBuf::from("/data/CrosSave/settings.json")
        );
        assert_eq!(paths.backup_root(), PathBuf::from("/data/CrosSaveBackups"));
    }
}
