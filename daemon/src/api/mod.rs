//! The HTTP API.
//!
//! | method           | path                    | handler                         |
//! |------------------|-------------------------|---------------------------------|
//! | GET, POST        | `/songs`                | [`list_songs`], [`create_song`] |
//! | GET              | `/songs/search`         | [`search_songs`]                |
//! | GET              | `/songs/avg/difficulty` | [`average_difficulty`]          |
//! | GET, PATCH, DELETE | `/songs/:id`          | [`get_song`], [`update_song`], [`delete_song`] |
//! | GET, POST        | `/songs/:id/rating`     | [`rating_summary`], [`rate_song`] |
//! | GET              | `/health`               | [`health::health_check`]        |
//!
//! Anything else, including an unsupported method on one of these paths, is `404 route_not_found`.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod errors;
pub mod extract;
pub mod handlers;
pub mod health;
pub mod wire;

use errors::route_not_found;
use handlers::{
    average_difficulty, create_song, delete_song, get_song, list_songs, rate_song, rating_summary,
    search_songs, update_song,
};

/// Build the router serving the whole API over `state`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/songs",
            get(list_songs).post(create_song).fallback(route_not_found),
        )
        .route(
            "/songs/search",
            get(search_songs).fallback(route_not_found),
        )
        .route(
            "/songs/avg/difficulty",
            get(average_difficulty).fallback(route_not_found),
        )
        .route(
            "/songs/:id",
            get(get_song)
                .patch(update_song)
                .delete(delete_song)
                .fallback(route_not_found),
        )
        .route(
            "/songs/:id/rating",
            post(rate_song).get(rating_summary).fallback(route_not_found),
        )
        .merge(health::health_routes())
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
