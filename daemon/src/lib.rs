//----------------------------------------------------------------------------------------- std lib
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
//--------------------------------------------------------------------------------- other libraries
use log::{error, info};
use surrealdb::engine::any::Any;
use tokio::net::TcpListener;
//------------------------------------------------------------------------------ SONGBOOK libraries
use songbook_core::{
    config::Settings,
    logger::{init_logger, init_tracing},
};
use songbook_storage::db::{connect, crud::SongStore};

pub mod api;
pub mod termination;

pub use api::build_router;

/// State shared by every request handler.
///
/// Cloning is cheap, every clone talks over the same database connection.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: SongStore<Any>,
}

impl AppState {
    #[must_use]
    pub const fn new(store: SongStore<Any>) -> Self {
        Self { store }
    }
}

/// Install the logger and the global tracing subscriber, both filtered at `level`.
///
/// Must be called at most once per process.
///
/// # Errors
///
/// Returns an error if a global tracing subscriber was already installed.
pub fn init_observability(level: log::LevelFilter) -> anyhow::Result<()> {
    init_logger(level);
    tracing::subscriber::set_global_default(init_tracing(level))?;
    Ok(())
}

/// Run the daemon
///
/// also initializes the logger, tracing, and the database connection.
/// The connection is opened before the listener, and released after the server has shut down.
///
/// # Errors
///
/// If the database can't be reached, or the daemon cannot listen on its port, an error is returned.
pub async fn start_daemon(settings: Settings) -> anyhow::Result<()> {
    init_observability(settings.daemon.log_level)?;

    info!(
        "Using the \"{}\" environment ({})",
        settings.environment_name, settings.environment.endpoint
    );

    // Open the one connection every request shares.
    let db = connect(&settings.connect_options()).await?;
    let store = SongStore::new(db, settings.store_options());

    // initialize the termination handler
    let (_terminator, mut interrupt_rx) = termination::create_termination();

    let server_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), settings.daemon.port);
    let listener = match TcpListener::bind(server_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to start server: {e}");
            return Err(anyhow::anyhow!("Failed to start server: {e}"));
        }
    };
    info!("Listening on {}", listener.local_addr()?);

    let app = build_router(AppState::new(store.clone()));

    // run the server until it is terminated
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            match interrupt_rx.wait().await {
                Ok(reason) => info!("Stopping server because of {reason}"),
                Err(e) => error!("Stopping server because of an unexpected error: {e}"),
            }
        })
        .await?;

    drop(store);
    info!("Cleanup complete, exiting...");

    Ok(())
}
