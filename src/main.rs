#![forbid(unsafe_code)]

mod cli;
mod color;
mod config;
mod constants;
mod error;
mod gui;
mod i18n;
mod payload;
mod persistence;
mod render;
mod store;
mod studio;
mod style;
mod types;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload};

use cli::{Cli, Command, CommandRunner};
use config::AppConfig;
use persistence::{FileStore, KeyValueStore, MemoryStore};
use store::AppStore;

/// File store under the data dir, or an in-memory one if that dir is unusable
fn open_store(config: &AppConfig) -> AppStore<Box<dyn KeyValueStore>> {
    let dir = config.resolved_data_dir();
    let backend: Box<dyn KeyValueStore> = match FileStore::open(&dir) {
        Ok(store) => {
            info!(dir = %store.dir().display(), "Using file store");
            Box::new(store)
        }
        Err(e) => {
            error!(error = ?e, "Data directory unavailable, changes will not survive this session");
            Box::new(MemoryStore::new())
        }
    };
    AppStore::open(backend)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // LOG_LEVEL governs until the config is loaded, then the configured level applies
    let bootstrap = AppConfig::bootstrap_level(|var| std::env::var(var).ok());
    let (level_filter, level_handle) = reload::Layer::new(LevelFilter::from_level(bootstrap));
    tracing_subscriber::registry()
        .with(level_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        config.data_dir = Some(dir);
    }
    level_handle.reload(LevelFilter::from_level(config.tracing_level()))?;

    info!(
        data_dir = %config.resolved_data_dir().display(),
        debounce_ms = config.debounce_ms,
        "Configuration loaded"
    );

    let mut store = open_store(&config);
    let translator = i18n::load_for_store(&mut store, config.locales_dir.as_deref());

    match cli.command.unwrap_or(Command::Gui) {
        Command::Gui => gui::run_gui(config, store, translator),
        command => CommandRunner {
            config: &config,
            store: &mut store,
            translator,
        }
        .run(command),
    }
}
