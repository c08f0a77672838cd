//! CrosSave command-line entry point.

mod app;
mod args;

use std::sync::Arc;

use crossave_device::FsDeviceProvider;
use crossave_settings::AppPaths;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,crossave=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args::parse(&args).map_err(|e| anyhow::anyhow!("{e} (see --help)"))?;
    if command == args::Command::Help {
        print!("{}", args::USAGE_TEXT);
        return Ok(());
    }

    let paths = AppPaths::new()?;
    let provider = FsDeviceProvider::from_env();
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        data = %paths.base().display(),
        roots = ?provider.roots(),
        "starting CrosSave"
    );

    let mut app = app::App::new(paths, Arc::new(provider))?;
    app.execute(command, &mut std::io::stdout().lock())
}
