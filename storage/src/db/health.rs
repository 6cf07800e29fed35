//! this module hold the implementations of functions needed for the health check of the database

use surrealdb::{Connection, Surreal};
use tracing::instrument;

use crate::{
    db::{queries::generic::Count, schemas::song::TABLE_NAME},
    errors::Error,
};

/// Count the number of songs in the database
///
/// # Errors
///
/// see [`Count::count`]
#[instrument]
pub async fn count_songs<C: Connection>(db: &Surreal<C>) -> Result<u64, Error> {
    Count::count(db, TABLE_NAME).await
}
