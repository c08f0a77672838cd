//! Command execution against the catalog, settings and sync engine.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use crossave_backup::BackupStore;
use crossave_catalog::{CatalogBuilder, CatalogStore, Game};
use crossave_device::DeviceProvider;
use crossave_settings::{AppPaths, SettingsService};
use crossave_sync::{SyncDirection, SyncEngine, SyncEvent, SyncRequest, SyncRunner};
use tracing::info;

use crate::args::{Command, USAGE_TEXT};

pub struct App {
    paths: AppPaths,
    provider: Arc<dyn DeviceProvider>,
    settings: SettingsService,
    catalog: CatalogStore,
}

impl App {
    pub fn new(paths: AppPaths, provider: Arc<dyn DeviceProvider>) -> anyhow::Result<Self> {
        let settings = SettingsService::new(paths.settings_file());
        let catalog = CatalogStore::new(paths.catalog_file())
            .with_context(|| format!("loading {}", paths.catalog_file().display()))?;
        Ok(Self {
            paths,
            provider,
            settings,
            catalog,
        })
    }

    pub fn execute(&mut self, command: Command, out: &mut dyn Write) -> anyhow::Result<()> {
        match command {
            Command::Help => write!(out, "{USAGE_TEXT}")?,
            Command::Users => self.users(out)?,
            Command::Games { user } => self.games(&user, out)?,
            Command::Configure {
                user,
                game_id,
                path,
            } => self.configure(&user, &game_id, &path, out)?,
            Command::Unconfigure { user, game_id } => {
                if self.catalog.clear_config_path(&user, &game_id)? {
                    writeln!(out, "{game_id}: local folder cleared for {user}")?;
                } else {
                    writeln!(out, "{game_id}: nothing configured for {user}")?;
                }
            }
            Command::Pull { user, game_id } => {
                self.sync(SyncDirection::Pull, &user, &game_id, out)?
            }
            Command::Push { user, game_id } => {
                self.sync(SyncDirection::Push, &user, &game_id, out)?
            }
            Command::SetSteamId(id) => {
                let mut settings = self.settings.load()?;
                settings.steam_id64 = id;
                self.settings.save(&settings)?;
                match id {
                    Some(id) => writeln!(out, "Steam id set to {id}")?,
                    None => writeln!(out, "Steam id cleared")?,
                }
            }
            Command::Backups { game_name } => self.backups(&game_name, out)?,
        }
        Ok(())
    }

    fn builder(&self) -> CatalogBuilder {
        CatalogBuilder::new(self.provider.clone())
    }

    fn users(&self, out: &mut dyn Write) -> anyhow::Result<()> {
        let users = self.builder().discover_users()?;
        if users.is_empty() {
            writeln!(out, "no users found (is the Switch connected?)")?;
        }
        for user in users {
            writeln!(out, "{}", user.display_name)?;
        }
        Ok(())
    }

    fn games(&mut self, user: &str, out: &mut dyn Write) -> anyhow::Result<()> {
        let discovered = self.builder().discover_games_for_user(user)?;
        let games = if discovered.is_empty() {
            writeln!(out, "no games found on the Switch; showing configured games")?;
            self.catalog.games_for_user(user).to_vec()
        } else {
            self.catalog.merge_discovered(user, discovered)
        };

        for game in &games {
            let folder = if game.is_configured() {
                game.config_path.as_str()
            } else {
                "-"
            };
            writeln!(out, "{}  {}  {}", game.game_id, game.name, folder)?;
            writeln!(out, "    cover: {}", game.image_url())?;
        }
        Ok(())
    }

    fn configure(
        &mut self,
        user: &str,
        game_id: &str,
        path: &str,
        out: &mut dyn Write,
    ) -> anyhow::Result<()> {
        let dir = Path::new(path);
        if !dir.is_dir() {
            bail!("{path} is not a directory");
        }
        let dir = std::fs::canonicalize(dir).with_context(|| format!("resolving {path}"))?;

        let game = match self.find_game(user, game_id) {
            Some(game) => game,
            None => {
                let discovered = self.builder().discover_games_for_user(user)?;
                self.catalog
                    .merge_discovered(user, discovered)
                    .into_iter()
                    .find(|g| g.game_id.eq_ignore_ascii_case(game_id))
                    .with_context(|| format!("no game {game_id} found for {user} on the Switch"))?
            }
        };

        let dir = dir.to_string_lossy();
        self.catalog.set_config_path(user, &game, &dir)?;
        info!(user = %user, game = %game.name, path = %dir, "game configured");
        writeln!(out, "{} ({}): {}", game.name, game.game_id, dir)?;
        Ok(())
    }

    fn find_game(&self, user: &str, game_id: &str) -> Option<Game> {
        self.catalog
            .games_for_user(user)
            .iter()
            .find(|g| g.game_id.eq_ignore_ascii_case(game_id))
            .cloned()
    }

    fn sync(
        &mut self,
        direction: SyncDirection,
        user: &str,
        game_id: &str,
        out: &mut dyn Write,
    ) -> anyhow::Result<()> {
        let game = self.find_game(user, game_id).with_context(|| {
            format!("{game_id} has no local folder for {user}; run `crossave configure` first")
        })?;
        let settings = self.settings.load()?;

        let engine = SyncEngine::new(
            self.provider.clone(),
            BackupStore::new(self.paths.backup_root()),
        );
        let mut runner = SyncRunner::new(engine);
        let events = runner.take_events();
        let cancel = runner.cancel_token();
        let request = SyncRequest {
            direction,
            user_id: user.to_string(),
            game,
            steam_id64: settings.steam_id64,
        };

        let rt = tokio::runtime::Runtime::new()?;
        let report = rt.block_on(async move {
            let interrupt = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("cancelling after the current file...");
                    cancel.cancel();
                }
            });
            let progress = events.map(|mut rx| {
                tokio::spawn(async move {
                    while let Some(event) = rx.recv().await {
                        if let SyncEvent::FileCopied { name, done, total } = event {
                            eprintln!("[{done}/{total}] {name}");
                        }
                    }
                })
            });

            let result = runner.run(request).await;
            interrupt.abort();
            if let Some(progress) = progress {
                progress.abort();
            }
            result
        })?;

        writeln!(
            out,
            "{direction} of {} done: {} file(s) copied",
            report.game_name,
            report.files.len()
        )?;
        if !report.patched.is_empty() {
            writeln!(out, "account id written to {} file(s)", report.patched.len())?;
        }
        writeln!(out, "backup: {}", report.backup.path.display())?;
        Ok(())
    }

    fn backups(&self, game_name: &str, out: &mut dyn Write) -> anyhow::Result<()> {
        let store = BackupStore::new(self.paths.backup_root());
        let snapshots = store.list_snapshots(game_name)?;
        if snapshots.is_empty() {
            writeln!(out, "no backups for {game_name}")?;
        }
        for snap in snapshots {
            writeln!(
                out,
                "{:<6}  {}  {} file(s)  {}",
                snap.side.as_str(),
                snap.taken_at.format("%Y-%m-%d %H:%M:%S"),
                snap.file_count,
                snap.path.display()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossave_catalog::{installed_games_root, save_dir};
    use crossave_device::FsDeviceProvider;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
        app: App,
    }

    fn push_device_path(root: &Path, components: impl Iterator<Item = String>) -> PathBuf {
        let mut path = root.to_path_buf();
        for c in components {
            path.push(c);
        }
        path
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let device = tmp.path().join("mounts").join("Nintendo Switch");
        let installed = push_device_path(
            &device,
            installed_games_root().join("GameA").join("id1").components().map(String::from),
        );
        let saves = push_device_path(
            &device,
            save_dir("GameA", "alice").components().map(String::from),
        );
        fs::create_dir_all(installed).unwrap();
        fs::create_dir_all(&saves).unwrap();
        fs::write(saves.join("save0"), b"switch").unwrap();
        fs::create_dir_all(tmp.path().join("pc")).unwrap();

        let provider = Arc::new(FsDeviceProvider::new(vec![tmp.path().join("mounts")]));
        let app = App::new(AppPaths::with_base(tmp.path().join("data")), provider).unwrap();
        Fixture { tmp, app }
    }

    fn run(app: &mut App, command: Command) -> anyhow::Result<String> {
        let mut out = Vec::new();
        app.execute(command, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn users_and_games_from_device() {
        let mut fx = fixture();
        assert_eq!(run(&mut fx.app, Command::Users).unwrap(), "alice\n");

        let out = run(
            &mut fx.app,
            Command::Games {
                user: "alice".into(),
            },
        )
        .unwrap();
        assert!(out.starts_with("id1  GameA  -\n"));
        assert!(out.contains("https://tinfoil.media/ti/id1/0/0/"));
    }

    #[test]
    fn configure_pull_and_list_backups() {
        let mut fx = fixture();
        let pc = fx.tmp.path().join("pc");
        run(
            &mut fx.app,
            Command::Configure {
                user: "alice".into(),
                game_id: "id1".into(),
                path: pc.to_string_lossy().into_owned(),
            },
        )
        .unwrap();

        let out = run(
            &mut fx.app,
            Command::Pull {
                user: "alice".into(),
                game_id: "id1".into(),
            },
        )
        .unwrap();
        assert!(out.contains("pull of GameA done: 1 file(s) copied"));
        assert_eq!(fs::read(pc.join("save0")).unwrap(), b"switch");

        let out = run(
            &mut fx.app,
            Command::Backups {
                game_name: "GameA".into(),
            },
        )
        .unwrap();
        assert!(out.starts_with("pc"));
    }

    #[test]
    fn configure_persists_across_sessions() {
        let mut fx = fixture();
        let pc = fx.tmp.path().join("pc");
        run(
            &mut fx.app,
            Command::Configure {
                user: "alice".into(),
                game_id: "id1".into(),
                path: pc.to_string_lossy().into_owned(),
            },
        )
        .unwrap();

        let provider = Arc::new(FsDeviceProvider::new(Vec::new()));
        let reopened = App::new(AppPaths::with_base(fx.tmp.path().join("data")), provider).unwrap();
        let game = reopened.find_game("alice", "id1").unwrap();
        assert_eq!(game.name, "GameA");
        assert!(game.is_configured());
    }

    #[test]
    fn configure_rejects_missing_directory() {
        let mut fx = fixture();
        let err = run(
            &mut fx.app,
            Command::Configure {
                user: "alice".into(),
                game_id: "id1".into(),
                path: fx.tmp.path().join("nope").to_string_lossy().into_owned(),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn push_requires_configuration() {
        let mut fx = fixture();
        let err = run(
            &mut fx.app,
            Command::Push {
                user: "alice".into(),
                game_id: "id1".into(),
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("crossave configure"));
    }

    #[test]
    fn steam_id_saved() {
        let mut fx = fixture();
        run(&mut fx.app, Command::SetSteamId(Some(42))).unwrap();
        assert_eq!(fx.app.settings.load().unwrap().steam_id64, Some(42));
        run(&mut fx.app, Command::SetSteamId(None)).unwrap();
        assert_eq!(fx.app.settings.load().unwrap().steam_id64, None);
    }
}
