use anyhow::Result;
use serde_json::Value;
use surrealdb::{
    Surreal,
    engine::any::{self, Any},
};

use crate::db::{
    crud::{SongStore, StoreOptions},
    provision::declare_schema,
    schemas::song::NewSong,
};

/// Initialize a fresh in-memory database with the song table declared.
///
/// Every call gets its own database, tests never see each other's songs.
///
/// # Errors
///
/// This function will return an error if the database cannot be initialized.
pub async fn init_test_database() -> Result<Surreal<Any>> {
    let db = any::connect("mem://").await?;
    db.use_ns("test").await?;
    db.use_db("test").await?;

    declare_schema(&db).await?;

    Ok(db)
}

/// Initialize a fresh in-memory store with the default options.
///
/// # Errors
///
/// This function will return an error if the database cannot be initialized.
pub async fn init_test_store() -> Result<SongStore<Any>> {
    Ok(SongStore::new(
        init_test_database().await?,
        StoreOptions::default(),
    ))
}

/// Validate a json song, panicking if it isn't one.
///
/// # Panics
///
/// Panics if `value` is not a valid new song.
#[must_use]
pub fn new_song(value: Value) -> NewSong {
    match NewSong::validate(&value) {
        Ok(song) => song,
        Err(errors) => panic!("invalid test song {value}: {errors}"),
    }
}
