//! Pull and push between the device save tree and a local directory.
//!
//! Both directions follow the same shape: validate the request, find and
//! connect the Switch, snapshot the side about to be overwritten, then copy
//! file by file. A failure at any step ends the operation without rollback.
//! The connection is released on every path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossave_backup::{BackupStore, LocalDirSource, Side};
use crossave_catalog::{Game, save_dir, saves_root};
use crossave_device::{
    Connection, Device, DevicePath, DeviceProvider, RetryConfig, find_switch,
};
use crossave_patch::{patch_directory, rule_for};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::SyncError;
use crate::source::DeviceDirSource;
use crate::types::{SyncDirection, SyncEvent, SyncReport, SyncRequest};

/// Runs pulls and pushes against the first attached Switch.
pub struct SyncEngine {
    provider: Arc<dyn DeviceProvider>,
    backups: BackupStore,
    retry: RetryConfig,
    cancel: CancellationToken,
    events: Option<mpsc::Sender<SyncEvent>>,
}

impl SyncEngine {
    pub fn new(provider: Arc<dyn DeviceProvider>, backups: BackupStore) -> Self {
        Self {
            provider,
            backups,
            retry: RetryConfig::default(),
            cancel: CancellationToken::new(),
            events: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Token checked before connecting and between files.
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Channel receiving [`SyncEvent::Started`] and
    /// [`SyncEvent::FileCopied`]. Events are dropped when it is full.
    pub fn with_events(mut self, events: mpsc::Sender<SyncEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn backups(&self) -> &BackupStore {
        &self.backups
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn run(&self, request: &SyncRequest) -> Result<SyncReport, SyncError> {
        match request.direction {
            SyncDirection::Pull => self.pull(&request.user_id, &request.game, request.steam_id64),
            SyncDirection::Push => self.push(&request.user_id, &request.game),
        }
    }

    /// Copies the device saves of (`user_id`, `game`) into the game's local
    /// directory, after snapshotting that directory.
    ///
    /// Local files the device does not have are left alone. When the title
    /// embeds an account id and `steam_id64` is set, every file of the local
    /// directory is patched afterwards. Files that cannot be patched are
    /// reported together once the others are done.
    pub fn pull(
        &self,
        user_id: &str,
        game: &Game,
        steam_id64: Option<u64>,
    ) -> Result<SyncReport, SyncError> {
        let local_dir = validate(user_id, game)?;
        self.check_cancelled()?;
        self.emit(SyncEvent::Started {
            direction: SyncDirection::Pull,
            game_name: game.name.clone(),
        });

        let Some(mut device) = find_switch(self.provider.as_ref())? else {
            return Err(SyncError::DeviceNotFound);
        };
        let conn = Connection::open(device.as_mut(), &self.retry)?;
        let remote_dir = resolve_save_dir(&*conn, &game.name, user_id)?;

        let backup = self
            .backups
            .snapshot(&LocalDirSource::new(&local_dir), &game.name, Side::Pc)?;

        let remote_files = conn.get_files(&remote_dir)?;
        let total = remote_files.len();
        let mut files = Vec::with_capacity(total);
        for remote in &remote_files {
            self.check_cancelled()?;
            let Some(name) = remote.file_name() else {
                continue;
            };
            let dest = local_dir.join(name);
            self.retry
                .run("download", || conn.download_file(remote, &dest))?;
            files.push(name.to_string());
            self.emit(SyncEvent::FileCopied {
                name: name.to_string(),
                done: files.len(),
                total,
            });
        }
        drop(conn);

        let account_patch = rule_for(&game.game_id).and_then(|rule| rule.account_patch);
        let patched = match (account_patch, steam_id64) {
            (Some(patch), Some(account_id)) => patch_directory(&local_dir, &patch, account_id)?,
            (Some(_), None) => {
                warn!(game = %game.name, "no Steam id configured, pulled saves left unpatched");
                Vec::new()
            }
            _ => Vec::new(),
        };

        info!(
            game = %game.name,
            user = %user_id,
            files = files.len(),
            patched = patched.len(),
            "pull completed"
        );

        Ok(SyncReport {
            direction: SyncDirection::Pull,
            game_name: game.name.clone(),
            user_id: user_id.to_string(),
            backup,
            files,
            patched,
        })
    }

    /// Uploads every file of the game's local directory to the device,
    /// after snapshotting the device folder.
    ///
    /// Existing destination files are deleted first, under every name the
    /// title's rule may have given them.
    pub fn push(&self, user_id: &str, game: &Game) -> Result<SyncReport, SyncError> {
        let local_dir = validate(user_id, game)?;
        self.check_cancelled()?;
        self.emit(SyncEvent::Started {
            direction: SyncDirection::Push,
            game_name: game.name.clone(),
        });

        let Some(mut device) = find_switch(self.provider.as_ref())? else {
            return Err(SyncError::DeviceNotFound);
        };
        let mut conn = Connection::open(device.as_mut(), &self.retry)?;
        let remote_dir = resolve_save_dir(&*conn, &game.name, user_id)?;

        let backup = self.backups.snapshot(
            &DeviceDirSource::new(&*conn, remote_dir.clone()),
            &game.name,
            Side::Switch,
        )?;

        let rule = rule_for(&game.game_id);
        let local_files = list_local_files(&local_dir)?;
        let total = local_files.len();
        let mut files = Vec::with_capacity(total);
        for (local_name, local_path) in &local_files {
            self.check_cancelled()?;
            let device_name = rule.map_or(local_name.as_str(), |r| r.device_name(local_name));
            let stale: Vec<DevicePath> = match rule {
                Some(r) => r
                    .device_names(local_name)
                    .iter()
                    .map(|n| remote_dir.join(n))
                    .collect(),
                None => vec![remote_dir.join(local_name)],
            };
            let dest = remote_dir.join(device_name);

            self.retry.run("upload", || {
                for path in &stale {
                    if conn.file_exists(path)? {
                        conn.delete_file(path)?;
                        debug!(path = %path, "removed previous device copy");
                    }
                }
                conn.upload_file(local_path, &dest)
            })?;

            files.push(device_name.to_string());
            self.emit(SyncEvent::FileCopied {
                name: device_name.to_string(),
                done: files.len(),
                total,
            });
        }
        drop(conn);

        info!(game = %game.name, user = %user_id, files = files.len(), "push completed");

        Ok(SyncReport {
            direction: SyncDirection::Push,
            game_name: game.name.clone(),
            user_id: user_id.to_string(),
            backup,
            files,
            patched: Vec::new(),
        })
    }

    fn check_cancelled(&self) -> Result<(), SyncError> {
        if self.cancel.is_cancelled() {
            Err(SyncError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn emit(&self, event: SyncEvent) {
        if let Some(tx) = &self.events {
            if let Err(e) = tx.try_send(event) {
                debug!(error = %e, "sync event dropped");
            }
        }
    }
}

/// Checks the request before any device or disk side effect.
fn validate(user_id: &str, game: &Game) -> Result<PathBuf, SyncError> {
    if user_id.trim().is_empty() {
        return Err(SyncError::ConfigInvalid("no user selected".into()));
    }
    if game.name.is_empty() {
        return Err(SyncError::ConfigInvalid("game has no name".into()));
    }
    if !game.is_configured() {
        return Err(SyncError::ConfigInvalid(format!(
            "no local save directory configured for {}",
            game.name
        )));
    }
    let local_dir = PathBuf::from(&game.config_path);
    if !local_dir.is_dir() {
        return Err(SyncError::PathNotFound(game.config_path.clone()));
    }
    Ok(local_dir)
}

/// Regular files directly inside `dir`, sorted by name.
fn list_local_files(dir: &Path) -> Result<Vec<(String, PathBuf)>, SyncError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
        }
    }
    files.sort();
    Ok(files)
}

/// Device folder holding the saves of (`game_name`, `user_id`).
///
/// Falls back to a user folder whose name differs only in ASCII case.
fn resolve_save_dir(
    device: &dyn Device,
    game_name: &str,
    user_id: &str,
) -> Result<DevicePath, SyncError> {
    let exact = save_dir(game_name, user_id);
    if device.directory_exists(&exact)? {
        return Ok(exact);
    }

    let game_dir = saves_root().join(game_name);
    if device.directory_exists(&game_dir)? {
        let found = device
            .get_directories(&game_dir)?
            .into_iter()
            .find(|dir| dir.file_name().is_some_and(|n| n.eq_ignore_ascii_case(user_id)));
        if let Some(dir) = found {
            debug!(requested = %user_id, found = %dir, "user folder matched ignoring case");
            return Ok(dir);
        }
    }
    Err(SyncError::PathNotFound(exact.to_string()))
}
