#![allow(clippy::module_name_repetitions)]
//----------------------------------------------------------------------------------------- std lib
use std::{
    collections::BTreeSet,
    sync::{LazyLock, Mutex},
};
//--------------------------------------------------------------------------------- other libraries
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type SongId = RecordId;

pub const TABLE_NAME: &str = "song";

/// Ids generated within the same millisecond still sort in creation order.
static ID_GENERATOR: LazyLock<Mutex<ulid::Generator>> =
    LazyLock::new(|| Mutex::new(ulid::Generator::new()));

/// This struct holds all the data stored about a particular [`Song`].
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Song {
    /// The unique identifier for this [`Song`], assigned by the store.
    pub id: SongId,
    /// Title of the [`Song`].
    pub title: String,
    /// Artist of the [`Song`].
    pub artist: String,
    /// Title of the album this [`Song`] appears on.
    #[serde(default)]
    pub album: Option<String>,
    /// Total runtime of this [`Song`], in whole seconds.
    #[serde(default)]
    pub duration_seconds: Option<u32>,
    /// Free-form labels, kept sorted and de-duplicated.
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// The difficulty tier of this [`Song`].
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub difficulty: Option<f64>,
    /// Release date, as supplied.
    #[serde(default)]
    pub released: Option<String>,
}

impl Song {
    /// Generate a fresh id, ULIDs are never reused.
    #[must_use]
    pub fn generate_id() -> SongId {
        let ulid = ID_GENERATOR
            .lock()
            .ok()
            .and_then(|mut generator| generator.generate().ok())
            .unwrap_or_else(ulid::Ulid::new);
        RecordId::from_table_key(TABLE_NAME, ulid.to_string())
    }

    /// Parse the public key of a song (the ULID part of its record id) into a [`SongId`].
    ///
    /// Returns `None` if `key` is not a valid ULID, such a key can never name a stored song.
    #[must_use]
    pub fn parse_id(key: &str) -> Option<SongId> {
        let ulid = ulid::Ulid::from_string(key.trim()).ok()?;
        Some(RecordId::from_table_key(TABLE_NAME, ulid.to_string()))
    }

    /// The public key of this song, the ULID part of its record id.
    #[must_use]
    pub fn key(&self) -> String {
        song_key(&self.id)
    }
}

/// The public key of a [`SongId`].
#[must_use]
pub fn song_key(id: &SongId) -> String {
    match id.key().clone().into_inner() {
        surrealdb::sql::Id::String(key) => key,
        other => other.to_string(),
    }
}

/// A validated song that has not been stored yet.
///
/// Only constructible through [`NewSong::validate`](crate::db::validation).
#[derive(Clone, Debug, PartialEq)]
pub struct NewSong {
    pub(crate) title: String,
    pub(crate) artist: String,
    pub(crate) album: Option<String>,
    pub(crate) duration_seconds: Option<u32>,
    pub(crate) tags: BTreeSet<String>,
    pub(crate) level: Option<u32>,
    pub(crate) difficulty: Option<f64>,
    pub(crate) released: Option<String>,
}

impl NewSong {
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub(crate) fn into_song(self, id: SongId) -> Song {
        Song {
            id,
            title: self.title,
            artist: self.artist,
            album: self.album,
            duration_seconds: self.duration_seconds,
            tags: self.tags,
            level: self.level,
            difficulty: self.difficulty,
            released: self.released,
        }
    }
}

/// A validated partial update.
///
/// `None` leaves a field untouched, `Some(None)` clears an optional field.
#[derive(Debug, Default, Serialize, Clone, PartialEq)]
pub struct SongChangeSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) artist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) album: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) duration_seconds: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) tags: Option<BTreeSet<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) level: Option<Option<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) difficulty: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) released: Option<Option<String>>,
}

impl SongChangeSet {
    /// Whether applying this change set would leave a song untouched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// The ratings left on a song, read back without the rest of the record.
#[derive(Clone, Debug, Default, Deserialize)]
pub(crate) struct SongRatings {
    #[serde(default)]
    pub ratings: Vec<u8>,
}

/// Minimum, maximum, and average of a song's ratings.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RatingSummary {
    pub count: usize,
    pub min: Option<u8>,
    pub max: Option<u8>,
    pub average: Option<f64>,
}

impl RatingSummary {
    pub const MIN_RATING: u8 = 1;
    pub const MAX_RATING: u8 = 5;

    #[must_use]
    pub fn from_ratings(ratings: &[u8]) -> Self {
        let count = ratings.len();
        let average = (count > 0).then(|| {
            #[allow(clippy::cast_precision_loss)]
            let mean = ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / count as f64;
            mean
        });
        Self {
            count,
            min: ratings.iter().min().copied(),
            max: ratings.iter().max().copied(),
            average,
        }
    }
}

/// Mean difficulty of the songs in one level.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct LevelDifficulty {
    pub level: u32,
    pub average_difficulty: f64,
}
