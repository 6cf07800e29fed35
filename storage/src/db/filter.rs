//! Filtering and pagination for song listings.

use serde::{Deserialize, Serialize};

use super::schemas::song::Song;

/// The page size used when a request doesn't ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// The largest page size ever served, larger requests are clamped to this.
pub const MAX_PAGE_SIZE: u32 = 100;

/// How a filter value is compared against a field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// The field must equal the filter value.
    Exact,
    /// The field must contain the filter value.
    #[default]
    Contains,
}

impl std::str::FromStr for MatchMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "contains" | "substring" => Ok(Self::Contains),
            _ => Err(()),
        }
    }
}

/// Default query semantics, applied when a request doesn't override them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct QueryOptions {
    #[serde(default)]
    pub match_mode: MatchMode,
    #[serde(default)]
    pub case_sensitive: bool,
}

/// Filter on the indexed fields of a song.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SongFilter {
    pub artist: Option<String>,
    pub title: Option<String>,
    pub match_mode: MatchMode,
    pub case_sensitive: bool,
}

impl SongFilter {
    /// A filter that matches everything, using the given query semantics for any value added later.
    #[must_use]
    pub const fn new(options: QueryOptions) -> Self {
        Self {
            artist: None,
            title: None,
            match_mode: options.match_mode,
            case_sensitive: options.case_sensitive,
        }
    }

    #[must_use]
    pub fn artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub const fn match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.artist.is_none() && self.title.is_none()
    }
}

/// Offset and page size, the page size always lies in `1..=MAX_PAGE_SIZE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    offset: u64,
    limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    /// Build a pagination, clamping the page size instead of rejecting it.
    #[must_use]
    pub fn new(offset: Option<u64>, limit: Option<u64>) -> Self {
        let limit = limit.map_or(DEFAULT_PAGE_SIZE, |limit| {
            u32::try_from(limit.clamp(1, u64::from(MAX_PAGE_SIZE))).unwrap_or(MAX_PAGE_SIZE)
        });
        Self {
            // the store's integers are signed
            offset: offset.unwrap_or_default().min(i64::MAX as u64),
            limit,
        }
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }

    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }
}

/// One page of a listing, along with the number of songs matching the filter overall.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    pub songs: Vec<Song>,
    pub pagination: Pagination,
    pub total: u64,
}

impl Page {
    /// Whether songs past the end of this page match the filter.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.pagination.offset + (self.songs.len() as u64) < self.total
    }
}
