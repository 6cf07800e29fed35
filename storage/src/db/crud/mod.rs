//! Data access for the song table.

pub mod song;

pub use song::{SongStore, StoreOptions};
