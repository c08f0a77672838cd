//! CrosSave app data locations and persisted settings.
//!
//! Everything lives under one local data directory:
//!
//! - `CrosSave/game_data.json`: the per-user game catalog
//! - `CrosSave/settings.json`: [`AppSettings`]
//! - `CrosSaveBackups/`: backup snapshots

mod paths;
mod service;

pub use paths::{AppPaths, DATA_DIR_ENV};
pub use service::{AppSettings, SettingsService, parse_steam_id64};

/// Errors from settings and path resolution.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("local data directory not available")]
    NoDataDir,

    #[error("invalid Steam id: {0}")]
    InvalidSteamId(String),
}
