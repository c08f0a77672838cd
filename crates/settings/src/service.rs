//! The `settings.json` document and its load/save service.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::SettingsError;

/// Persisted app settings: `{ "SteamId64": <u64 | null> }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppSettings {
    /// Steam account written into patched save files.
    #[serde(default)]
    pub steam_id64: Option<u64>,
}

/// Loads and saves [`AppSettings`]. Holds no cached copy; callers keep the
/// value they loaded.
#[derive(Debug, Clone)]
pub struct SettingsService {
    path: PathBuf,
}

impl SettingsService {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads settings from disk.
    ///
    /// A missing file gives defaults. An unparsable file also gives defaults,
    /// with a warning, so a bad edit never locks the user out.
    pub fn load(&self) -> Result<AppSettings, SettingsError> {
        if !self.path.exists() {
            return Ok(AppSettings::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        match serde_json::from_str::<AppSettings>(&content) {
            Ok(settings) => {
                debug!(path = %self.path.display(), "settings loaded");
                Ok(settings)
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to parse settings, using defaults"
                );
                Ok(AppSettings::default())
            }
        }
    }

    /// Overwrites the settings file with `settings`.
    pub fn save(&self, settings: &AppSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        std::fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

/// Parses a decimal SteamID64.
pub fn parse_steam_id64(input: &str) -> Result<u64, SettingsError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SettingsError::InvalidSteamId(input.to_string()));
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| SettingsError::InvalidSteamId(input.to_string()))
}
