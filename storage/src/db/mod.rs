pub mod crud;
pub mod filter;
pub mod health;
pub mod provision;
pub mod queries;
pub mod schemas;
pub mod validation;

use std::time::Duration;

use log::{info, warn};
use surrealdb::{
    Surreal,
    engine::any::{self, Any},
};
use tracing::instrument;

use crate::errors::Error;

/// Where and how to reach the song database.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Any surrealdb engine url, e.g. `mem://`, `surrealkv://path/to/db`, or `ws://localhost:8000`
    pub endpoint: String,
    pub namespace: String,
    pub database: String,
    pub connect_timeout: Duration,
}

/// Open the process-wide connection to the song database.
///
/// # Errors
///
/// Returns [`Error::StoreUnavailable`] if the endpoint can't be reached, the namespace or database can't be selected,
/// or either step takes longer than `connect_timeout`.
#[instrument]
pub async fn connect(options: &ConnectOptions) -> Result<Surreal<Any>, Error> {
    let attempt = async {
        let db = any::connect(options.endpoint.as_str()).await?;
        db.use_ns(options.namespace.as_str()).await?;
        db.use_db(options.database.as_str()).await?;
        Ok::<_, surrealdb::Error>(db)
    };

    match tokio::time::timeout(options.connect_timeout, attempt).await {
        Ok(Ok(db)) => {
            info!(
                "Connected to song database at {} ({}/{})",
                options.endpoint, options.namespace, options.database
            );
            Ok(db)
        }
        Ok(Err(e)) => {
            warn!("Failed to connect to {}: {e}", options.endpoint);
            Err(Error::StoreUnavailable(e.to_string()))
        }
        Err(_) => {
            warn!(
                "Timed out after {:?} connecting to {}",
                options.connect_timeout, options.endpoint
            );
            Err(Error::StoreUnavailable(format!(
                "timed out after {}ms",
                options.connect_timeout.as_millis()
            )))
        }
    }
}
