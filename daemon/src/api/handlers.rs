//! Handlers for the `/songs` resource.
//!
//! Each handler validates its input, calls the song store, and shapes the result.
//! Writes run on a detached task so a client hanging up can't cancel them halfway.

use std::{future::Future, num::IntErrorKind};

use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
};
use log::error;
use serde::Deserialize;

use songbook_storage::db::{
    filter::{MatchMode, Pagination},
    schemas::song::{LevelDifficulty, NewSong, Song, SongChangeSet, SongId, song_key},
    validation::validate_rating,
};

use super::{
    errors::ApiError,
    extract::{JsonObject, SongKey},
    wire::{PageResponse, RatingResponse, SongResponse, StatusResponse},
};
use crate::AppState;

/// Run a store write to completion on its own task, independent of the request that started it.
async fn detached<T, F>(write: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(write).await.unwrap_or_else(|e| {
        error!("A store write did not run to completion: {e}");
        Err(ApiError::Internal)
    })
}

/// Keys that aren't ULIDs can't name a stored song.
fn parse_key(key: &str) -> Result<SongId, ApiError> {
    Song::parse_id(key).ok_or_else(|| ApiError::SongNotFound(key.to_owned()))
}

fn query<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(params)| params)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// A query parameter that must be a non-negative integer when present.
fn parse_number<N: std::str::FromStr>(
    parameter: &'static str,
    value: Option<&str>,
) -> Result<Option<N>, ApiError> {
    value
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|_| ApiError::invalid_parameter(parameter, value))
        })
        .transpose()
}

/// A page size, values too large to parse are as good as the largest page size.
fn parse_limit(value: Option<&str>) -> Result<Option<u64>, ApiError> {
    value
        .map(|value| match value.trim().parse::<u64>() {
            Ok(limit) => Ok(limit),
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => Ok(u64::MAX),
            Err(_) => Err(ApiError::invalid_parameter("limit", value)),
        })
        .transpose()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub artist: Option<String>,
    pub title: Option<String>,
    #[serde(rename = "match")]
    pub match_mode: Option<String>,
    pub offset: Option<String>,
    pub limit: Option<String>,
}

/// GET /songs
///
/// One page of songs, optionally filtered by artist and/or title.
pub async fn list_songs(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<PageResponse>, ApiError> {
    let params = query(params)?;

    let mut filter = state.store.filter();
    if let Some(artist) = non_blank(params.artist) {
        filter = filter.artist(artist);
    }
    if let Some(title) = non_blank(params.title) {
        filter = filter.title(title);
    }
    if let Some(mode) = params.match_mode {
        let mode = mode
            .parse::<MatchMode>()
            .map_err(|()| ApiError::invalid_parameter("match", &mode))?;
        filter = filter.match_mode(mode);
    }

    let pagination = Pagination::new(
        parse_number("offset", params.offset.as_deref())?,
        parse_limit(params.limit.as_deref())?,
    );

    let page = state
        .store
        .list(filter, pagination)
        .await
        .map_err(ApiError::store)?;
    Ok(Json(page.into()))
}

/// POST /songs
pub async fn create_song(
    State(AppState { store }): State<AppState>,
    JsonObject(body): JsonObject,
) -> Result<(StatusCode, Json<SongResponse>), ApiError> {
    let song = NewSong::validate(&body)?;

    let song = detached(async move { store.insert(song).await.map_err(ApiError::store) }).await?;
    Ok((StatusCode::CREATED, Json(song.into())))
}

/// GET /songs/:id
pub async fn get_song(
    State(state): State<AppState>,
    SongKey(key): SongKey,
) -> Result<Json<SongResponse>, ApiError> {
    let id = parse_key(&key)?;

    let song = state
        .store
        .get(&id)
        .await
        .map_err(|e| ApiError::song(e, &key))?;
    Ok(Json(song.into()))
}

/// PATCH /songs/:id
///
/// Only the supplied fields change, `null` clears an optional field.
pub async fn update_song(
    State(AppState { store }): State<AppState>,
    SongKey(key): SongKey,
    JsonObject(body): JsonObject,
) -> Result<Json<SongResponse>, ApiError> {
    let id = parse_key(&key)?;
    let changes = SongChangeSet::validate(&body)?;

    let song = detached(async move {
        store
            .update(&id, changes)
            .await
            .map_err(|e| ApiError::song(e, &key))
    })
    .await?;
    Ok(Json(song.into()))
}

/// DELETE /songs/:id
pub async fn delete_song(
    State(AppState { store }): State<AppState>,
    SongKey(key): SongKey,
) -> Result<StatusCode, ApiError> {
    let id = parse_key(&key)?;

    detached(async move {
        store
            .delete(&id)
            .await
            .map_err(|e| ApiError::song(e, &key))
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub message: Option<String>,
    pub limit: Option<String>,
}

/// GET /songs/search?message=
///
/// Full text search over artist and title, best matches first.
pub async fn search_songs(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<SongResponse>>, ApiError> {
    let params = query(params)?;

    let message = non_blank(params.message).ok_or(ApiError::MissingParameter("message"))?;
    let limit = Pagination::new(None, parse_limit(params.limit.as_deref())?).limit();

    let songs = state
        .store
        .search(&message, limit)
        .await
        .map_err(ApiError::store)?;
    Ok(Json(songs.into_iter().map(SongResponse::from).collect()))
}

/// POST /songs/:id/rating
pub async fn rate_song(
    State(AppState { store }): State<AppState>,
    SongKey(key): SongKey,
    JsonObject(body): JsonObject,
) -> Result<Json<StatusResponse>, ApiError> {
    let id = parse_key(&key)?;
    let rating = validate_rating(&body)?;

    detached(async move {
        store
            .rate(&id, rating)
            .await
            .map_err(|e| ApiError::song(e, &key))
    })
    .await?;
    Ok(Json(StatusResponse::OK))
}

/// GET /songs/:id/rating
pub async fn rating_summary(
    State(state): State<AppState>,
    SongKey(key): SongKey,
) -> Result<Json<RatingResponse>, ApiError> {
    let id = parse_key(&key)?;

    let summary = state
        .store
        .rating_summary(&id)
        .await
        .map_err(|e| ApiError::song(e, &key))?;
    Ok(Json(RatingResponse {
        id: song_key(&id),
        summary,
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct DifficultyParams {
    pub level: Option<String>,
}

/// GET /songs/avg/difficulty
///
/// The mean difficulty of every level, or of the one level asked for.
pub async fn average_difficulty(
    State(state): State<AppState>,
    params: Result<Query<DifficultyParams>, QueryRejection>,
) -> Result<Json<Vec<LevelDifficulty>>, ApiError> {
    let params = query(params)?;
    let level = parse_number("level", params.level.as_deref())?;

    let levels = state
        .store
        .average_difficulty(level)
        .await
        .map_err(ApiError::store)?;
    Ok(Json(levels))
}
