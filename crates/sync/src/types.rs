use std::fmt;

use crossave_backup::BackupSnapshot;
use crossave_catalog::Game;

/// Which way saves travel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    /// Device to local directory.
    Pull,
    /// Local directory to device.
    Push,
}

impl fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncDirection::Pull => f.write_str("pull"),
            SyncDirection::Push => f.write_str("push"),
        }
    }
}

/// One pull or push to perform.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub direction: SyncDirection,
    pub user_id: String,
    pub game: Game,
    /// Account written into pulled saves of titles that embed one.
    pub steam_id64: Option<u64>,
}

/// Outcome of a successful pull or push.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub direction: SyncDirection,
    pub game_name: String,
    pub user_id: String,
    /// Snapshot of the side that was overwritten.
    pub backup: BackupSnapshot,
    /// Names of the files copied, as written at the destination.
    pub files: Vec<String>,
    /// Local files rewritten with the account id.
    pub patched: Vec<String>,
}

/// Progress event emitted while a sync runs.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    Started {
        direction: SyncDirection,
        game_name: String,
    },
    /// One file reached its destination.
    FileCopied {
        name: String,
        done: usize,
        total: usize,
    },
    Completed {
        direction: SyncDirection,
        game_name: String,
        files: usize,
    },
    Failed {
        direction: SyncDirection,
        game_name: String,
        error: String,
    },
}
