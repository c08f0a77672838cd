//! Timestamped snapshot directories of one side of a sync.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime};
use tracing::{debug, info};

use crate::checksum::file_checksum;
use crate::source::{SnapshotSource, validate_file_name};
use crate::BackupError;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const MAX_SUFFIX: u32 = 1000;

/// Which side of a sync a snapshot was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Pc,
    Switch,
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Pc => "pc",
            Side::Switch => "switch",
        }
    }

    fn from_prefix(s: &str) -> Option<Self> {
        match s {
            "pc" => Some(Side::Pc),
            "switch" => Some(Side::Switch),
            _ => None,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One copied file inside a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupFile {
    pub name: String,
    pub size: u64,
    pub sha256: String,
}

/// A snapshot written by [`BackupStore::snapshot`].
#[derive(Debug, Clone)]
pub struct BackupSnapshot {
    pub path: PathBuf,
    pub game_name: String,
    pub side: Side,
    pub created: DateTime<Local>,
    pub files: Vec<BackupFile>,
}

/// A snapshot found on disk by [`BackupStore::list_snapshots`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotInfo {
    pub path: PathBuf,
    pub side: Side,
    pub taken_at: NaiveDateTime,
    pub file_count: usize,
}

/// Writes snapshots under `<root>/<gameName>/`.
#[derive(Debug, Clone)]
pub struct BackupStore {
    root: PathBuf,
}

impl BackupStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder holding every snapshot of `game_name`.
    pub fn game_dir(&self, game_name: &str) -> PathBuf {
        self.root.join(sanitize_dir_name(game_name))
    }

    /// Copies every file of `source` into a fresh snapshot directory.
    ///
    /// Any failure is returned before the caller touches the other side.
    /// A partially written directory is left in place for inspection.
    pub fn snapshot(
        &self,
        source: &dyn SnapshotSource,
        game_name: &str,
        side: Side,
    ) -> Result<BackupSnapshot, BackupError> {
        let created = Local::now();
        let game_dir = self.game_dir(game_name);
        std::fs::create_dir_all(&game_dir)?;

        let base = format!("{}_{}", side, created.format(TIMESTAMP_FORMAT));
        let path = create_fresh_dir(&game_dir, &base)?;
        debug!(path = %path.display(), "snapshot directory created");

        let mut files = Vec::new();
        for name in source.file_names()? {
            validate_file_name(&name)?;
            let dest = path.join(&name);
            source.copy_to(&name, &dest)?;
            let size = std::fs::metadata(&dest)?.len();
            let sha256 = file_checksum(&dest)?;
            files.push(BackupFile { name, size, sha256 });
        }

        info!(
            game = %game_name,
            side = %side,
            path = %path.display(),
            files = files.len(),
            "backup snapshot written"
        );

        Ok(BackupSnapshot {
            path,
            game_name: game_name.to_string(),
            side,
            created,
            files,
        })
    }

    /// Snapshots of `game_name`, oldest first. An unknown game has none.
    pub fn list_snapshots(&self, game_name: &str) -> Result<Vec<SnapshotInfo>, BackupError> {
        let game_dir = self.game_dir(game_name);
        if !game_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut snapshots = Vec::new();
        for entry in std::fs::read_dir(&game_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let dir_name = entry.file_name().to_string_lossy().into_owned();
            let Some((side, taken_at)) = parse_dir_name(&dir_name) else {
                continue;
            };
            let mut file_count = 0;
            for file in std::fs::read_dir(entry.path())? {
                if file?.file_type()?.is_file() {
                    file_count += 1;
                }
            }
            snapshots.push(SnapshotInfo {
                path: entry.path(),
                side,
                taken_at,
                file_count,
            });
        }
        snapshots.sort_by(|a, b| a.taken_at.cmp(&b.taken_at).then_with(|| a.path.cmp(&b.path)));
        Ok(snapshots)
    }
}

/// Creates `<parent>/<base>`, or `<base>-2`, `<base>-3`, … if taken.
fn create_fresh_dir(parent: &Path, base: &str) -> Result<PathBuf, BackupError> {
    for n in 1..=MAX_SUFFIX {
        let name = if n == 1 {
            base.to_string()
        } else {
            format!("{base}-{n}")
        };
        let candidate = parent.join(name);
        match std::fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(BackupError::Exhausted(parent.display().to_string()))
}

/// `pc_20240101_120000` or `switch_20240101_120000-2`.
fn parse_dir_name(name: &str) -> Option<(Side, NaiveDateTime)> {
    let (prefix, rest) = name.split_once('_')?;
    let side = Side::from_prefix(prefix)?;
    let stamp = match rest.split_once('-') {
        Some((stamp, suffix)) if suffix.bytes().all(|b| b.is_ascii_digit()) => stamp,
        Some(_) => return None,
        None => rest,
    };
    let taken_at = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
    Some((side, taken_at))
}

/// Game names come from the device and may hold characters Windows rejects.
fn sanitize_dir_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim_end_matches(['.', ' ']).trim_start();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}
