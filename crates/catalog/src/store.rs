//! Persistent per-user game catalog.
//!
//! Stored as `{ "<userId>": [ { "Name", "GameId", "ConfigPath" } ] }`.
//! Only configured entries (non-empty `ConfigPath`) ever reach the file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::CatalogError;
use crate::types::Game;

/// The session's catalog, flushed to disk whenever a game's configured
/// state changes.
pub struct CatalogStore {
    path: PathBuf,
    users: BTreeMap<String, Vec<Game>>,
}

impl CatalogStore {
    /// Opens the catalog at `path`, loading existing entries if the file exists.
    pub fn new(path: PathBuf) -> Result<Self, CatalogError> {
        let users = load_catalog(&path)?;
        Ok(Self { path, users })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured games for `user_id`, in insertion order.
    ///
    /// User ids match ignoring ASCII case, like the device's user folders.
    pub fn games_for_user(&self, user_id: &str) -> &[Game] {
        self.users
            .get(&self.user_key(user_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Stored local directory for (`user_id`, `game_id`), if configured.
    pub fn config_path(&self, user_id: &str, game_id: &str) -> Option<&str> {
        self.games_for_user(user_id)
            .iter()
            .find(|g| g.game_id == game_id)
            .map(|g| g.config_path.as_str())
            .filter(|p| !p.is_empty())
    }

    /// All user ids that have an entry.
    pub fn user_ids(&self) -> Vec<String> {
        self.users.keys().cloned().collect()
    }

    /// Attaches stored directories to freshly discovered games.
    ///
    /// The user's in-memory list becomes the configured subset of
    /// `discovered`, so titles no longer on the device fall out. Nothing is
    /// written until the next configuration change.
    pub fn merge_discovered(&mut self, user_id: &str, discovered: Vec<Game>) -> Vec<Game> {
        let merged: Vec<Game> = discovered
            .into_iter()
            .map(|mut game| {
                if let Some(path) = self.config_path(user_id, &game.game_id) {
                    game.config_path = path.to_string();
                }
                game
            })
            .collect();

        let configured = merged.iter().filter(|g| g.is_configured()).cloned().collect();
        let key = self.user_key(user_id);
        self.users.insert(key, configured);
        merged
    }

    /// Sets the local directory for `game` and persists.
    ///
    /// Any previous entry for the same title id is replaced. An empty
    /// `config_path` clears the entry.
    pub fn set_config_path(
        &mut self,
        user_id: &str,
        game: &Game,
        config_path: &str,
    ) -> Result<(), CatalogError> {
        let key = self.user_key(user_id);
        let list = self.users.entry(key).or_default();
        list.retain(|g| g.game_id != game.game_id);
        if !config_path.is_empty() {
            list.push(Game {
                name: game.name.clone(),
                game_id: game.game_id.clone(),
                config_path: config_path.to_string(),
            });
        }
        self.persist()
    }

    /// Removes the entry for (`user_id`, `game_id`) and persists.
    ///
    /// Returns whether an entry was removed.
    pub fn clear_config_path(&mut self, user_id: &str, game_id: &str) -> Result<bool, CatalogError> {
        let key = self.user_key(user_id);
        let Some(list) = self.users.get_mut(&key) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|g| g.game_id != game_id);
        let removed = list.len() != before;
        if removed {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Existing key for `user_id` ignoring ASCII case, or `user_id` itself.
    fn user_key(&self, user_id: &str) -> String {
        if self.users.contains_key(user_id) {
            return user_id.to_string();
        }
        self.users
            .keys()
            .find(|key| key.eq_ignore_ascii_case(user_id))
            .cloned()
            .unwrap_or_else(|| user_id.to_string())
    }

    /// Writes the configured entries to disk.
    fn persist(&self) -> Result<(), CatalogError> {
        let configured: BTreeMap<&String, Vec<&Game>> = self
            .users
            .iter()
            .map(|(user, games)| (user, games.iter().filter(|g| g.is_configured()).collect()))
            .collect();

        let json = serde_json::to_string_pretty(&configured)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;
        debug!(users = configured.len(), path = %self.path.display(), "persisted catalog");
        Ok(())
    }
}

/// Loads the catalog file, keeping configured entries only (last one per
/// title id wins).
fn load_catalog(path: &Path) -> Result<BTreeMap<String, Vec<Game>>, CatalogError> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let data = std::fs::read_to_string(path)?;
    let raw: BTreeMap<String, Vec<Game>> = serde_json::from_str(&data)?;

    let users: BTreeMap<String, Vec<Game>> = raw
        .into_iter()
        .map(|(user, games)| {
            let mut kept: Vec<Game> = Vec::new();
            for game in games.into_iter().filter(Game::is_configured) {
                kept.retain(|g| g.game_id != game.game_id);
                kept.push(game);
            }
            (user, kept)
        })
        .collect();

    debug!(users = users.len(), path = %path.display(), "loaded catalog");
    Ok(users)
}
