//! Device tree walking: users and per-user games.
//!
//! Reading the device and interpreting what was read are kept apart: the
//! `read_*` functions only list folders, while [`users_from_saves`] and
//! [`games_for_user`] are pure and carry the matching rules.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crossave_device::{Connection, Device, DeviceProvider, RetryConfig, find_switch};
use tracing::{debug, info, warn};

use crate::error::CatalogError;
use crate::layout::{installed_games_root, saves_root};
use crate::types::{Game, UserProfile};

/// Save folders found on the device: game name → user ids.
pub type SaveTree = BTreeMap<String, Vec<String>>;

/// What to do when one game name resolves to several title ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Surface one entry per title id and log a warning.
    #[default]
    Warn,
    /// Fail the lookup with [`CatalogError::AmbiguousGameName`].
    Strict,
}

/// Title ids grouped by the game-name folder they were found under.
///
/// Every (name, id) pair is kept, so collisions stay visible.
#[derive(Debug, Clone, Default)]
pub struct TitleIndex {
    by_name: BTreeMap<String, Vec<String>>,
}

impl TitleIndex {
    /// Records `game_id` under `name`. Ids compare case-insensitively.
    pub fn insert(&mut self, name: &str, game_id: &str) {
        let ids = self.by_name.entry(name.to_string()).or_default();
        if !ids.iter().any(|id| id.eq_ignore_ascii_case(game_id)) {
            ids.push(game_id.to_string());
        }
    }

    /// Title ids recorded for `name` (exact match).
    pub fn ids_for(&self, name: &str) -> &[String] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Game names that carry more than one title id.
    pub fn collisions(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.by_name
            .iter()
            .filter(|(_, ids)| ids.len() > 1)
            .map(|(name, ids)| (name.as_str(), ids.as_slice()))
    }

    /// Number of distinct game names.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Lists `4: Installed games/<gameName>/<gameId>`.
///
/// A missing root yields an empty index.
pub fn read_title_index(device: &dyn Device) -> Result<TitleIndex, CatalogError> {
    let root = installed_games_root();
    let mut index = TitleIndex::default();
    if !device.directory_exists(&root)? {
        warn!(root = %root, "installed games folder not found on device");
        return Ok(index);
    }

    for name_dir in device.get_directories(&root)? {
        let Some(name) = name_dir.file_name() else {
            continue;
        };
        for id_dir in device.get_directories(&name_dir)? {
            if let Some(id) = id_dir.file_name() {
                index.insert(name, id);
            }
        }
    }

    debug!(titles = index.len(), "read installed titles");
    Ok(index)
}

/// Lists `7: Saves/Installed games/<gameName>/<userId>`.
///
/// A missing root yields an empty tree.
pub fn read_save_tree(device: &dyn Device) -> Result<SaveTree, CatalogError> {
    let root = saves_root();
    let mut tree = SaveTree::new();
    if !device.directory_exists(&root)? {
        warn!(root = %root, "saves folder not found on device");
        return Ok(tree);
    }

    for name_dir in device.get_directories(&root)? {
        let Some(name) = name_dir.file_name() else {
            continue;
        };
        let users: Vec<String> = device
            .get_directories(&name_dir)?
            .iter()
            .filter_map(|d| d.file_name().map(str::to_string))
            .collect();
        tree.insert(name.to_string(), users);
    }

    debug!(games = tree.len(), "read save folders");
    Ok(tree)
}

/// Users owning at least one save folder, de-duplicated ignoring case.
///
/// The first spelling seen wins; the result is sorted by user id.
pub fn users_from_saves(saves: &SaveTree) -> Vec<UserProfile> {
    let mut seen = HashSet::new();
    let mut users = Vec::new();
    for user_id in saves.values().flatten() {
        if seen.insert(user_id.to_lowercase()) {
            users.push(UserProfile::from_folder(user_id));
        }
    }
    users.sort();
    users
}

/// Games `user_id` has saves for whose name resolves to a title id.
///
/// Entries come out in save-folder order, at most one per title id.
pub fn games_for_user(
    index: &TitleIndex,
    saves: &SaveTree,
    user_id: &str,
    policy: CollisionPolicy,
) -> Result<Vec<Game>, CatalogError> {
    let mut games = Vec::new();
    let mut seen_ids = HashSet::new();

    for (name, users) in saves {
        if !users.iter().any(|u| u.eq_ignore_ascii_case(user_id)) {
            continue;
        }

        let ids = index.ids_for(name);
        match ids {
            [] => {
                debug!(game = %name, "save folder without installed title, skipping");
                continue;
            }
            [_] => {}
            _ => match policy {
                CollisionPolicy::Strict => {
                    return Err(CatalogError::AmbiguousGameName {
                        name: name.clone(),
                        ids: ids.to_vec(),
                    });
                }
                CollisionPolicy::Warn => {
                    warn!(game = %name, ids = ?ids, "game name shared by several titles");
                }
            },
        }

        for id in ids {
            if seen_ids.insert(id.to_lowercase()) {
                games.push(Game::new(name.clone(), id.clone()));
            }
        }
    }

    Ok(games)
}

/// Discovers users and games on the first attached Switch.
///
/// Each call opens and releases its own connection. No device attached is
/// an empty result, not an error.
pub struct CatalogBuilder {
    provider: Arc<dyn DeviceProvider>,
    retry: RetryConfig,
    policy: CollisionPolicy,
}

impl CatalogBuilder {
    pub fn new(provider: Arc<dyn DeviceProvider>) -> Self {
        Self {
            provider,
            retry: RetryConfig::default(),
            policy: CollisionPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Users with save data on the device.
    pub fn discover_users(&self) -> Result<Vec<UserProfile>, CatalogError> {
        let Some(mut device) = find_switch(self.provider.as_ref())? else {
            info!("no Switch attached");
            return Ok(Vec::new());
        };

        let conn = Connection::open(device.as_mut(), &self.retry)?;
        let saves = read_save_tree(&*conn)?;
        let users = users_from_saves(&saves);

        info!(users = users.len(), "discovered users");
        Ok(users)
    }

    /// Installed games `user_id` has saves for.
    pub fn discover_games_for_user(&self, user_id: &str) -> Result<Vec<Game>, CatalogError> {
        let Some(mut device) = find_switch(self.provider.as_ref())? else {
            info!("no Switch attached");
            return Ok(Vec::new());
        };

        let conn = Connection::open(device.as_mut(), &self.retry)?;
        let index = read_title_index(&*conn)?;
        let saves = read_save_tree(&*conn)?;
        drop(conn);

        for (name, ids) in index.collisions() {
            debug!(game = %name, ids = ?ids, "title index collision");
        }

        let games = games_for_user(&index, &saves, user_id, self.policy)?;
        info!(user = %user_id, games = games.len(), "discovered games");
        Ok(games)
    }
}
