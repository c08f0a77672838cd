//! Command-line parsing.

use crossave_settings::parse_steam_id64;

pub const USAGE_TEXT: &str = "\
crossave - sync Nintendo Switch saves with a PC save folder

USAGE:
    crossave <COMMAND> [ARGS]

COMMANDS:
    users                               List users with saves on the Switch
    games <user>                        List the user's games and their local folders
    configure <user> <gameId> <path>    Set the local save folder of a game
    unconfigure <user> <gameId>         Forget the local save folder of a game
    pull <user> <gameId>                Copy saves from the Switch to the PC
    push <user> <gameId>                Copy saves from the PC to the Switch
    set-steam-id <id|none>              Steam account written into pulled saves
    backups <gameName>                  List backup snapshots of a game

ENVIRONMENT:
    CROSSAVE_DATA_DIR        Base directory for catalog, settings and backups
    CROSSAVE_DEVICE_ROOTS    Directories where MTP devices are mounted
    RUST_LOG                 Log filter (default: info,crossave=debug)
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Users,
    Games {
        user: String,
    },
    Configure {
        user: String,
        game_id: String,
        path: String,
    },
    Unconfigure {
        user: String,
        game_id: String,
    },
    Pull {
        user: String,
        game_id: String,
    },
    Push {
        user: String,
        game_id: String,
    },
    SetSteamId(Option<u64>),
    Backups {
        game_name: String,
    },
}

/// Parses the arguments after the program name.
pub fn parse(args: &[String]) -> Result<Command, String> {
    if args.iter().any(|a| a == "--help" || a == "-h") {
        return Ok(Command::Help);
    }
    let Some((name, rest)) = args.split_first() else {
        return Ok(Command::Help);
    };

    let command = match (name.as_str(), rest) {
        ("help", []) => Command::Help,
        ("users", []) => Command::Users,
        ("games", [user]) => Command::Games { user: user.clone() },
        ("configure", [user, game_id, path]) => Command::Configure {
            user: user.clone(),
            game_id: game_id.clone(),
            path: path.clone(),
        },
        ("unconfigure", [user, game_id]) => Command::Unconfigure {
            user: user.clone(),
            game_id: game_id.clone(),
        },
        ("pull", [user, game_id]) => Command::Pull {
            user: user.clone(),
            game_id: game_id.clone(),
        },
        ("push", [user, game_id]) => Command::Push {
            user: user.clone(),
            game_id: game_id.clone(),
        },
        ("set-steam-id", [id]) if id.eq_ignore_ascii_case("none") => Command::SetSteamId(None),
        ("set-steam-id", [id]) => {
            let id = parse_steam_id64(id).map_err(|e| e.to_string())?;
            Command::SetSteamId(Some(id))
        }
        ("backups", [game_name]) => Command::Backups {
            game_name: game_name.clone(),
        },
        (
            "users" | "games" | "configure" | "unconfigure" | "pull" | "push" | "set-steam-id"
            | "backups" | "help",
            _,
        ) => return Err(format!("wrong number of arguments for '{name}'")),
        _ => return Err(format!("unknown command '{name}'")),
    };
    Ok(command)
}
