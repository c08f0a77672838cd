//! Switch game catalog: discovery and persistence.
//!
//! The device exposes two trees:
//!
//! - `4: Installed games/<gameName>/<gameId>` maps display names to title ids
//! - `7: Saves/Installed games/<gameName>/<userId>` holds each user's saves
//!
//! [`CatalogBuilder`] walks both to find users and the games each user has
//! saves for. [`CatalogStore`] keeps the user's chosen local directory per
//! game in a JSON file.

pub mod builder;
pub mod error;
pub mod layout;
pub mod store;
pub mod types;

// Re-export primary types for convenience.
pub use builder::{
    CatalogBuilder, CollisionPolicy, SaveTree, TitleIndex, games_for_user, read_save_tree,
    read_title_index, users_from_saves,
};
pub use error::CatalogError;
pub use layout::{INSTALLED_GAMES_ROOT, SAVES_ROOT, installed_games_root, save_dir, saves_root};
pub use store::CatalogStore;
pub use types::{Game, UserProfile};
