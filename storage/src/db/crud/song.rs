//! CRUD operations for the song table
use std::{future::Future, time::Duration};

use log::warn;
use surrealdb::{Connection, Surreal};
use tracing::instrument;

use crate::{
    db::{
        filter::{Page, Pagination, QueryOptions, SongFilter},
        health::count_songs,
        queries::{generic::Count, song as queries},
        schemas::song::{
            LevelDifficulty, NewSong, RatingSummary, Song, SongChangeSet, SongId, SongRatings,
        },
        validation::{Reason, ValidationError, ValidationErrors},
    },
    errors::Error,
};

/// How long a single store operation may take when nothing else is configured.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StoreOptions {
    /// Operations taking longer than this fail with [`Error::StoreUnavailable`].
    pub request_timeout: Duration,
    /// Defaults for list filters.
    pub query: QueryOptions,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            query: QueryOptions::default(),
        }
    }
}

/// Handle to the song table.
///
/// Cloning is cheap, every clone shares the same underlying connection.
pub struct SongStore<C: Connection> {
    db: Surreal<C>,
    options: StoreOptions,
}

impl<C: Connection> Clone for SongStore<C> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            options: self.options,
        }
    }
}

impl<C: Connection> std::fmt::Debug for SongStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SongStore")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<C: Connection> SongStore<C> {
    #[must_use]
    pub const fn new(db: Surreal<C>, options: StoreOptions) -> Self {
        Self { db, options }
    }

    #[must_use]
    pub const fn db(&self) -> &Surreal<C> {
        &self.db
    }

    #[must_use]
    pub const fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// A filter matching every song, carrying this store's default query semantics.
    #[must_use]
    pub const fn filter(&self) -> SongFilter {
        SongFilter::new(self.options.query)
    }

    /// Run one store operation, giving up after the configured request timeout.
    async fn run<T>(
        &self,
        operation: &'static str,
        future: impl Future<Output = Result<T, Error>>,
    ) -> Result<T, Error> {
        let timeout = self.options.request_timeout;
        tokio::time::timeout(timeout, future).await.unwrap_or_else(|_| {
            warn!("Song store operation `{operation}` timed out after {timeout:?}");
            Err(Error::StoreUnavailable(format!(
                "{operation} timed out after {}ms",
                timeout.as_millis()
            )))
        })
    }

    /// Store a new song, the store assigns its id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotCreated`] if the database accepted the statement but returned no record.
    #[instrument]
    pub async fn insert(&self, song: NewSong) -> Result<Song, Error> {
        let song = song.into_song(Song::generate_id());
        self.run("insert", async {
            let created: Option<Song> = self.db.create(song.id.clone()).content(song).await?;
            created.ok_or(Error::NotCreated)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no song has this id.
    #[instrument]
    pub async fn get(&self, id: &SongId) -> Result<Song, Error> {
        self.run("get", async {
            let song: Option<Song> = self.db.select(id.clone()).await?;
            song.ok_or(Error::NotFound)
        })
        .await
    }

    /// Read one page of the songs matching `filter`, in id order, along with the total number of matches.
    ///
    /// # Errors
    ///
    /// Returns an error if either query fails.
    #[instrument]
    pub async fn list(&self, filter: SongFilter, pagination: Pagination) -> Result<Page, Error> {
        self.run("list", async {
            let mut query = self
                .db
                .query(queries::list(&filter))
                .query(queries::count_matching(&filter))
                .bind(("limit", pagination.limit()))
                .bind(("start", pagination.offset()));
            if let Some(artist) = filter.artist {
                query = query.bind(("artist", artist));
            }
            if let Some(title) = filter.title {
                query = query.bind(("title", title));
            }

            let mut response = query.await?;
            let songs: Vec<Song> = response.take(0)?;
            let total: Option<Count> = response.take(1)?;

            Ok(Page {
                songs,
                pagination,
                total: Count::or_zero(total),
            })
        })
        .await
    }

    /// Apply a partial update, fields the change set doesn't mention keep their values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no song has this id.
    #[instrument]
    pub async fn update(&self, id: &SongId, changes: SongChangeSet) -> Result<Song, Error> {
        if changes.is_empty() {
            return self.get(id).await;
        }

        self.run("update", async {
            let updated: Option<Song> = self.db.update(id.clone()).merge(changes).await?;
            updated.ok_or(Error::NotFound)
        })
        .await
    }

    /// Remove a song for good, returning what was removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no song has this id.
    #[instrument]
    pub async fn delete(&self, id: &SongId) -> Result<Song, Error> {
        self.run("delete", async {
            let deleted: Option<Song> = self.db.delete(id.clone()).await?;
            deleted.ok_or(Error::NotFound)
        })
        .await
    }

    /// Full text search over the titles and artists of songs.
    ///
    /// Matching ignores case and diacritics, title matches rank above artist matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails, e.g. because the search indices were never declared.
    #[instrument]
    pub async fn search(&self, text: &str, limit: u32) -> Result<Vec<Song>, Error> {
        let text = text.to_string();
        self.run("search", async {
            Ok(self
                .db
                .query(queries::search())
                .bind(("query", text))
                .bind(("limit", limit))
                .await?
                .take(0)?)
        })
        .await
    }

    /// Record a rating between [`RatingSummary::MIN_RATING`] and [`RatingSummary::MAX_RATING`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the rating is out of range,
    /// or [`Error::NotFound`] if no song has this id.
    #[instrument]
    pub async fn rate(&self, id: &SongId, rating: u8) -> Result<(), Error> {
        if !(RatingSummary::MIN_RATING..=RatingSummary::MAX_RATING).contains(&rating) {
            return Err(ValidationErrors::from(vec![ValidationError::new(
                "rating",
                Reason::OutOfRange,
            )])
            .into());
        }

        self.run("rate", async {
            let updated: Vec<SongRatings> = self
                .db
                .query(queries::add_rating())
                .bind(("id", id.clone()))
                .bind(("rating", rating))
                .await?
                .take(0)?;
            if updated.is_empty() {
                Err(Error::NotFound)
            } else {
                Ok(())
            }
        })
        .await
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no song has this id.
    #[instrument]
    pub async fn rating_summary(&self, id: &SongId) -> Result<RatingSummary, Error> {
        self.run("rating_summary", async {
            let ratings: Option<SongRatings> = self.db.select(id.clone()).await?;
            let ratings = ratings.ok_or(Error::NotFound)?;
            Ok(RatingSummary::from_ratings(&ratings.ratings))
        })
        .await
    }

    /// Mean difficulty per level, over the songs that have both.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    #[instrument]
    pub async fn average_difficulty(&self, level: Option<u32>) -> Result<Vec<LevelDifficulty>, Error> {
        self.run("average_difficulty", async {
            let query = self.db.query(queries::average_difficulty(level.is_some()));
            let query = match level {
                Some(level) => query.bind(("level", level)),
                None => query,
            };
            Ok(query.await?.take(0)?)
        })
        .await
    }

    /// # Errors
    ///
    /// Returns an error if the query fails.
    #[instrument]
    pub async fn count(&self) -> Result<u64, Error> {
        self.run("count", count_songs(&self.db)).await
    }

    /// Remove every song.
    #[instrument]
    pub(crate) async fn clear(&self) -> Result<(), Error> {
        self.run("clear", async {
            self.db.query(queries::delete_all()).await?.check()?;
            Ok(())
        })
        .await
    }
}
