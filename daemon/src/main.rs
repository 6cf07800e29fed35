//! This is the daemon binary that serves the Songbook API.
//! there are no tests or anything else in this file because the only thing it does is set up and start the daemon
//! with functions from the `songbook_daemon` library crate (which is tested).

use std::path::PathBuf;

use songbook_core::config::Settings;
use songbook_daemon::start_daemon;

use clap::Parser;

#[cfg(not(feature = "cli"))]
compile_error!("The cli feature is required to build the daemon binary");

/// Options configurable via the CLI.
#[derive(Parser)]
struct Flags {
    /// config file path
    #[clap(long)]
    config: Option<PathBuf>,
    /// Which `[environments.*]` block of the config file to use.
    #[clap(long, env = "SONGBOOK_ENV")]
    env: Option<String>,
    /// Sets the port number to listen on.
    #[clap(long)]
    port: Option<u16>,
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

    let settings = Settings::init(config_file, flags.env, flags.port, flags.log_level)?;

    start_daemon(settings).await
}
