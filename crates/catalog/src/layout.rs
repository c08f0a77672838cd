//! Fixed device folder layout.

use crossave_device::DevicePath;

/// Storage listing installed titles as `<gameName>/<gameId>`.
pub const INSTALLED_GAMES_ROOT: &str = "4: Installed games";

/// Storage listing save folders as `<gameName>/<userId>`.
pub const SAVES_ROOT: &str = "7: Saves\\Installed games";

pub fn installed_games_root() -> DevicePath {
    DevicePath::new(INSTALLED_GAMES_ROOT)
}

pub fn saves_root() -> DevicePath {
    DevicePath::new(SAVES_ROOT)
}

/// Save folder of one user for one game.
pub fn save_dir(game_name: &str, user_id: &str) -> DevicePath {
    saves_root().join(game_name).join(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_dir_is_two_levels_under_saves_root() {
        let dir = save_dir("Zelda", "alice");
        assert_eq!(dir.to_string(), "7: Saves\\Installed games\\Zelda\\alice");
        assert_eq!(dir.parent().unwrap().parent().unwrap(), saves_root());
    }
}
