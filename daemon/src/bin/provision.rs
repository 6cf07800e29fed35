//! One-shot provisioning of a song database: declares the schema and indices, then loads seed data.
//!
//! This is the only place songs can be removed in bulk, and only when `--drop` is passed.

use std::path::PathBuf;

use clap::Parser;
use log::info;

use songbook_core::config::Settings;
use songbook_daemon::init_observability;
use songbook_storage::db::{
    connect,
    crud::SongStore,
    provision::{SeedMode, declare_schema, load_seed, read_seed},
};

#[cfg(not(feature = "cli"))]
compile_error!("The cli feature is required to build the provisioning binary");

/// Options configurable via the CLI.
#[derive(Parser)]
struct Flags {
    /// config file path
    #[clap(long)]
    config: Option<PathBuf>,
    /// Which `[environments.*]` block of the config file to provision.
    #[clap(long, env = "SONGBOOK_ENV")]
    env: Option<String>,
    /// Seed records to load, one json song per line.
    #[clap(long)]
    seed: Option<PathBuf>,
    /// Remove every existing song before loading the seed records.
    #[clap(long, requires = "seed")]
    drop: bool,
    /// log level
    #[clap(long)]
    log_level: Option<log::LevelFilter>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let flags = Flags::try_parse()?;

    let config_file = match flags.config {
        Some(config_file) => config_file,
        None => Settings::get_config_path()?,
    };
    let settings = Settings::init(config_file, flags.env, None, flags.log_level)?;
    init_observability(settings.daemon.log_level)?;

    // read and validate every seed record before touching the database
    let records = match &flags.seed {
        Some(path) => Some(read_seed(path)?),
        None => None,
    };

    let db = connect(&settings.connect_options()).await?;
    declare_schema(&db).await?;

    if let Some(records) = records {
        let mode = if flags.drop {
            SeedMode::Replace
        } else {
            SeedMode::Append
        };
        let store = SongStore::new(db, settings.store_options());
        load_seed(&store, records, mode).await?;
    }

    info!(
        "Provisioned the \"{}\" environment ({})",
        settings.environment_name, settings.environment.endpoint
    );
    Ok(())
}
