//! Catalog data types.

use serde::{Deserialize, Serialize};

/// An installed title with save data, plus the user's local save directory.
///
/// Serialized with the field names of the catalog file
/// (`Name`, `GameId`, `ConfigPath`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Game {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub game_id: String,
    /// Local save directory; empty until the user configures one.
    #[serde(default)]
    pub config_path: String,
}

impl Game {
    pub fn new(name: impl Into<String>, game_id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            game_id: game_id.into(),
            config_path: String::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.config_path.is_empty()
    }

    /// Cover art URL for this title.
    pub fn image_url(&self) -> String {
        format!("https://tinfoil.media/ti/{}/0/0/", self.game_id)
    }
}

/// A Switch user that owns at least one save folder.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserProfile {
    pub user_id: String,
    pub display_name: String,
}

impl UserProfile {
    /// The save tree only carries the folder name, so it doubles as display name.
    pub fn from_folder(name: &str) -> Self {
        Self {
            user_id: name.to_string(),
            display_name: name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn game_json_field_names() {
        let mut game = Game::new("Zelda", "0100ABC");
        game.config_path = "C:\\Saves\\Zelda".into();
        let json = serde_json::to_string(&game).unwrap();
        assert!(json.contains("\"Name\""));
        assert!(json.contains("\"GameId\""));
        assert!(json.contains("\"ConfigPath\""));
    }

    #[test]
    fn image_url_uses_game_id() {
        let game = Game::new("Zelda", "0100ABC");
        assert_eq!(game.image_url(), "https://tinfoil.media/ti/0100ABC/0/0/");
    }

    #[test]
    fn missing_config_path_defaults_to_unconfigured() {
        let game: Game = serde_json::from_str(r#"{"Name":"Zelda","GameId":"0100ABC"}"#).unwrap();
        assert!(!game.is_configured());
    }
}
