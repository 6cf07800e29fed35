//! The json shapes sent back to clients.

use std::collections::BTreeSet;

use serde::Serialize;

use songbook_storage::db::{
    filter::Page,
    schemas::song::{RatingSummary, Song},
};

/// A song as clients see it, the id is the bare ULID key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SongResponse {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: Option<String>,
    pub duration_seconds: Option<u32>,
    pub tags: BTreeSet<String>,
    pub level: Option<u32>,
    pub difficulty: Option<f64>,
    pub released: Option<String>,
}

impl From<Song> for SongResponse {
    fn from(song: Song) -> Self {
        Self {
            id: song.key(),
            title: song.title,
            artist: song.artist,
            album: song.album,
            duration_seconds: song.duration_seconds,
            tags: song.tags,
            level: song.level,
            difficulty: song.difficulty,
            released: song.released,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageResponse {
    pub songs: Vec<SongResponse>,
    pub offset: u64,
    pub limit: u32,
    pub total: u64,
    pub has_more: bool,
}

impl From<Page> for PageResponse {
    fn from(page: Page) -> Self {
        let has_more = page.has_more();
        Self {
            offset: page.pagination.offset(),
            limit: page.pagination.limit(),
            total: page.total,
            has_more,
            songs: page.songs.into_iter().map(SongResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingResponse {
    pub id: String,
    #[serde(flatten)]
    pub summary: RatingSummary,
}

/// Acknowledges a write that has nothing else to return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub const OK: Self = Self { status: "ok" };
}

/// Health check response, the module name and version of the running daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub songs: u64,
}
