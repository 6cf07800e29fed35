//! Integration tests for the songbook HTTP API.
//!
//! Every test drives the router with `oneshot` against its own in-memory song database.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use surrealdb::{Surreal, engine::any::Any};
use tower::util::ServiceExt; // for `oneshot` method

use songbook_daemon::{AppState, build_router};
use songbook_storage::{
    db::{
        crud::{SongStore, StoreOptions},
        provision::{SeedMode, load_seed, parse_seed},
    },
    test_utils::init_test_store,
};

const SEED: &str = include_str!("../seed/songs.jsonl");

/// Test helper: a router over an empty song database.
async fn setup_app() -> Router {
    let store = init_test_store().await.unwrap();
    build_router(AppState::new(store))
}

/// Test helper: a router over the seed songs.
async fn setup_seeded_app() -> Router {
    let store = init_test_store().await.unwrap();
    load_seed(&store, parse_seed(SEED).unwrap(), SeedMode::Append)
        .await
        .unwrap();
    build_router(AppState::new(store))
}

/// Test helper: a router whose database client never connected.
fn setup_unreachable_app() -> Router {
    let store = SongStore::new(Surreal::<Any>::init(), StoreOptions::default());
    build_router(AppState::new(store))
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: send a request, returning the status and the json body (`null` when there is none).
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    if bytes.is_empty() {
        (status, Value::Null)
    } else {
        (
            status,
            serde_json::from_slice(&bytes).expect("Should parse JSON"),
        )
    }
}

async fn create(app: &Router, song: Value) -> Value {
    let (status, body) = send(app, json_request("POST", "/songs", &song)).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

fn titles(songs: &Value) -> Vec<&str> {
    songs
        .as_array()
        .unwrap()
        .iter()
        .map(|song| song["title"].as_str().unwrap())
        .collect()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = setup_seeded_app().await;

    let (status, body) = send(&app, test_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "songbook-daemon");
    assert!(body["version"].is_string());
    assert_eq!(body["songs"], 11);
}

#[rstest]
#[case("GET", "/health")]
#[case("GET", "/songs")]
#[case("GET", "/songs/search?message=Blue")]
#[case("GET", "/songs/avg/difficulty")]
#[case("GET", "/songs/01ARZ3NDEKTSV4RRFFQ69G5FAV")]
#[tokio::test]
async fn test_unreachable_store_is_unavailable(#[case] method: &str, #[case] uri: &str) {
    let app = setup_unreachable_app();

    let (status, body) = send(&app, test_request(method, uri)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "store_unavailable");
}

#[tokio::test]
async fn test_unreachable_store_rejects_writes() {
    let app = setup_unreachable_app();

    let (status, body) = send(
        &app,
        json_request("POST", "/songs", &json!({"title": "Blue", "artist": "Ana"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "store_unavailable");
}

// =============================================================================
// CRUD
// =============================================================================

#[tokio::test]
async fn test_song_lifecycle() {
    let app = setup_app().await;

    let created = create(
        &app,
        json!({"title": "Blue", "artist": "Ana", "duration_seconds": 210}),
    )
    .await;
    let id = created["id"].as_str().unwrap().to_owned();
    assert!(!id.is_empty());
    assert_eq!(created["title"], "Blue");
    assert_eq!(created["artist"], "Ana");
    assert_eq!(created["duration_seconds"], 210);

    let (status, fetched) = send(&app, test_request("GET", &format!("/songs/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = send(
        &app,
        json_request(
            "PATCH",
            &format!("/songs/{id}"),
            &json!({"duration_seconds": 215}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], id.as_str());
    assert_eq!(updated["title"], "Blue");
    assert_eq!(updated["artist"], "Ana");
    assert_eq!(updated["duration_seconds"], 215);

    let (status, body) = send(&app, test_request("DELETE", &format!("/songs/{id}"))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (status, body) = send(&app, test_request("GET", &format!("/songs/{id}"))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "song_not_found");
    assert_eq!(
        body["error"]["message"],
        format!("song_id \"{id}\" not found")
    );
}

#[rstest]
#[case::no_title(json!({"artist": "Ana"}), "title")]
#[case::no_artist(json!({"title": "Blue"}), "artist")]
#[case::blank_title(json!({"title": "  ", "artist": "Ana"}), "title")]
#[case::bad_duration(json!({"title": "Blue", "artist": "Ana", "duration_seconds": "long"}), "duration_seconds")]
#[case::assigned_id(json!({"id": "01HZY", "title": "Blue", "artist": "Ana"}), "id")]
#[tokio::test]
async fn test_create_rejects_invalid_song(#[case] song: Value, #[case] field: &str) {
    let app = setup_app().await;

    let (status, body) = send(&app, json_request("POST", "/songs", &song)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_failed");
    let fields = body["error"]["fields"].as_array().unwrap();
    assert!(fields.iter().any(|f| f["field"] == field), "{body}");

    // nothing was stored
    let (_, page) = send(&app, test_request("GET", "/songs")).await;
    assert_eq!(page["total"], 0);
}

#[tokio::test]
async fn test_create_reports_every_field() {
    let app = setup_app().await;

    let (status, body) = send(
        &app,
        json_request("POST", "/songs", &json!({"level": -1, "bpm": 120})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let mut fields = body["error"]["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect::<Vec<_>>();
    fields.sort_unstable();
    assert_eq!(fields, vec!["artist", "bpm", "level", "title"]);
}

#[tokio::test]
async fn test_create_normalizes_tags() {
    let app = setup_app().await;

    let created = create(
        &app,
        json!({"title": " Blue ", "artist": "Ana", "tags": ["rock", "blues", "rock"]}),
    )
    .await;
    assert_eq!(created["title"], "Blue");
    assert_eq!(created["tags"], json!(["blues", "rock"]));
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_requests() {
    let app = setup_app().await;

    let invalid_json = Request::builder()
        .method("POST")
        .uri("/songs")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();
    let (status, body) = send(&app, invalid_json).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let no_content_type = Request::builder()
        .method("POST")
        .uri("/songs")
        .body(Body::from(json!({"title": "Blue", "artist": "Ana"}).to_string()))
        .unwrap();
    let (status, body) = send(&app, no_content_type).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, body) = send(&app, json_request("POST", "/songs", &json!(["Blue", "Ana"]))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[rstest]
#[case::unknown_but_valid("01ARZ3NDEKTSV4RRFFQ69G5FAV")]
#[case::malformed("not-a-song")]
#[tokio::test]
async fn test_missing_song_is_song_not_found(#[case] key: &str) {
    let app = setup_app().await;

    for request in [
        test_request("GET", &format!("/songs/{key}")),
        test_request("DELETE", &format!("/songs/{key}")),
        json_request("PATCH", &format!("/songs/{key}"), &json!({"title": "Red"})),
        test_request("GET", &format!("/songs/{key}/rating")),
        json_request("POST", &format!("/songs/{key}/rating"), &json!({"rating": 3})),
    ] {
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "song_not_found");
    }
}

#[rstest]
#[case("GET", "/songs/%FF")]
#[case("DELETE", "/songs/%FF")]
#[case("GET", "/songs/%FF/rating")]
#[tokio::test]
async fn test_undecodable_song_key_is_bad_request(#[case] method: &str, #[case] uri: &str) {
    let app = setup_app().await;

    let (status, body) = send(&app, test_request(method, uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(body["error"]["message"].is_string());
}

#[rstest]
#[case("GET", "/nope")]
#[case("GET", "/songs/01ARZ3NDEKTSV4RRFFQ69G5FAV/lyrics")]
#[case("PUT", "/songs")]
#[case("POST", "/songs/search")]
#[case("DELETE", "/health")]
#[tokio::test]
async fn test_unknown_route_is_route_not_found(#[case] method: &str, #[case] uri: &str) {
    let app = setup_app().await;

    let (status, body) = send(&app, test_request(method, uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "route_not_found");
}

#[tokio::test]
async fn test_update_is_an_idempotent_merge() {
    let app = setup_app().await;
    let created = create(
        &app,
        json!({"title": "Blue", "artist": "Ana", "album": "Colors", "tags": ["pop"]}),
    )
    .await;
    let uri = format!("/songs/{}", created["id"].as_str().unwrap());
    let changes = json!({"artist": "Ana B", "level": 4});

    let (status, first) = send(&app, json_request("PATCH", &uri, &changes)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, second) = send(&app, json_request("PATCH", &uri, &changes)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first, second);

    assert_eq!(second["title"], "Blue");
    assert_eq!(second["album"], "Colors");
    assert_eq!(second["tags"], json!(["pop"]));
    assert_eq!(second["artist"], "Ana B");
    assert_eq!(second["level"], 4);

    // null clears optional fields, but never required ones
    let (status, cleared) = send(&app, json_request("PATCH", &uri, &json!({"album": null}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["album"], Value::Null);

    let (status, body) = send(&app, json_request("PATCH", &uri, &json!({"title": null}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "validation_failed");

    let (status, body) = send(&app, json_request("PATCH", &uri, &json!({"id": "01HZY"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["fields"][0]["reason"], "immutable");
}

#[tokio::test]
async fn test_delete_twice() {
    let app = setup_app().await;
    let created = create(&app, json!({"title": "Blue", "artist": "Ana"})).await;
    let uri = format!("/songs/{}", created["id"].as_str().unwrap());

    let (status, _) = send(&app, test_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, test_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "song_not_found");
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_list_empty() {
    let app = setup_app().await;

    let (status, body) = send(&app, test_request("GET", "/songs")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"songs": [], "offset": 0, "limit": 20, "total": 0, "has_more": false})
    );
}

#[tokio::test]
async fn test_list_pagination() {
    let app = setup_app().await;
    for title in ["One", "Two", "Three", "Four", "Five"] {
        create(&app, json!({"title": title, "artist": "Ana"})).await;
    }

    let (status, body) = send(&app, test_request("GET", "/songs?limit=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body["songs"]), vec!["One", "Two"]);
    assert_eq!(body["total"], 5);
    assert_eq!(body["has_more"], true);

    let (_, body) = send(&app, test_request("GET", "/songs?limit=2&offset=4")).await;
    assert_eq!(titles(&body["songs"]), vec!["Five"]);
    assert_eq!(body["has_more"], false);

    let (status, body) = send(&app, test_request("GET", "/songs?offset=10")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["songs"], json!([]));
    assert_eq!(body["total"], 5);
    assert_eq!(body["has_more"], false);
}

#[rstest]
#[case("limit=0", 1)]
#[case("limit=1000", 100)]
#[case("limit=99999999999999999999999", 100)]
#[case("", 20)]
#[tokio::test]
async fn test_list_limit_is_clamped(#[case] query: &str, #[case] expected: u64) {
    let app = setup_app().await;

    let (status, body) = send(&app, test_request("GET", &format!("/songs?{query}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["limit"], expected);
}

#[rstest]
#[case("offset=-1", "offset", "-1")]
#[case("offset=fake", "offset", "fake")]
#[case("limit=fake", "limit", "fake")]
#[case("limit=-1", "limit", "-1")]
#[case("match=fuzzy", "match", "fuzzy")]
#[tokio::test]
async fn test_list_rejects_bad_parameters(
    #[case] query: &str,
    #[case] parameter: &str,
    #[case] value: &str,
) {
    let app = setup_app().await;

    let (status, body) = send(&app, test_request("GET", &format!("/songs?{query}"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
    assert_eq!(
        body["error"]["message"],
        format!("\"{value}\" is not a valid argument for parameter \"{parameter}\"")
    );
}

#[rstest]
#[case::contains_any_case("artist=fastfinger", 1)]
#[case::contains_title("title=kennel", 1)]
#[case::both("artist=yousicians&title=the", 2)]
#[case::exact("artist=Mr%20Fastfinger&match=exact", 1)]
#[case::exact_is_whole_value("artist=Fastfinger&match=exact", 0)]
#[case::exact_ignores_case("artist=mr%20fastfinger&match=exact", 1)]
#[case::blank_is_no_filter("artist=", 11)]
#[tokio::test]
async fn test_list_filters(#[case] query: &str, #[case] expected: u64) {
    let app = setup_seeded_app().await;

    let (status, body) = send(&app, test_request("GET", &format!("/songs?{query}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], expected);
}

#[tokio::test]
async fn test_list_is_in_creation_order() {
    let app = setup_seeded_app().await;

    let (_, body) = send(&app, test_request("GET", "/songs?limit=3")).await;
    assert_eq!(
        titles(&body["songs"]),
        vec!["Lycanthropic Metamorphosis", "A New Kennel", "Awaki-Waki"]
    );
    assert_eq!(body["songs"][2]["artist"], "Mr Fastfinger");
}

// =============================================================================
// Search
// =============================================================================

#[rstest]
#[case::artist("Fastfinger")]
#[case::mixed_case("fAsTfInGeR")]
#[case::padded("%20Fastfinger%20")]
#[tokio::test]
async fn test_search_artist(#[case] message: &str) {
    let app = setup_seeded_app().await;

    let (status, body) = send(
        &app,
        test_request("GET", &format!("/songs/search?message={message}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["artist"], "Mr Fastfinger");
}

#[tokio::test]
async fn test_search_ignores_diacritics() {
    let app = setup_seeded_app().await;

    let (status, body) = send(
        &app,
        test_request("GET", "/songs/search?message=gr%C3%A9%C3%A5sy"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body), vec!["Greasy Fingers - boss level"]);
}

#[tokio::test]
async fn test_search_many_and_limit() {
    let app = setup_seeded_app().await;

    let (_, body) = send(&app, test_request("GET", "/songs/search?message=Yousicians")).await;
    assert_eq!(body.as_array().unwrap().len(), 10);

    let (_, body) = send(
        &app,
        test_request("GET", "/songs/search?message=Yousicians&limit=3"),
    )
    .await;
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (status, body) = send(
        &app,
        test_request("GET", "/songs/search?message=Yousicians&limit=99999999999999999999999"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 10);
}

#[rstest]
#[case("/songs/search")]
#[case("/songs/search?message=")]
#[case("/songs/search?message=%20%20")]
#[tokio::test]
async fn test_search_requires_message(#[case] uri: &str) {
    let app = setup_seeded_app().await;

    let (status, body) = send(&app, test_request("GET", uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "missing_parameter");
    assert_eq!(body["error"]["message"], "argument \"message\" is required");
}

// =============================================================================
// Ratings
// =============================================================================

#[tokio::test]
async fn test_rating() {
    let app = setup_app().await;
    let created = create(&app, json!({"title": "Blue", "artist": "Ana"})).await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/songs/{id}/rating");

    let (status, body) = send(&app, test_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"id": id, "count": 0, "min": null, "max": null, "average": null})
    );

    for rating in [4, 2, 3] {
        let (status, body) = send(&app, json_request("POST", &uri, &json!({"rating": rating}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    let (status, body) = send(&app, test_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"id": id, "count": 3, "min": 2, "max": 4, "average": 3.0})
    );

    // ratings never show up on the song itself
    let (_, song) = send(&app, test_request("GET", &format!("/songs/{id}"))).await;
    assert_eq!(song, created);
}

#[rstest]
#[case(json!({"rating": 0}), "validation_failed")]
#[case(json!({"rating": 6}), "validation_failed")]
#[case(json!({"rating": "5"}), "validation_failed")]
#[case(json!({}), "validation_failed")]
#[case(json!(5), "bad_request")]
#[tokio::test]
async fn test_rating_rejects(#[case] rating: Value, #[case] code: &str) {
    let app = setup_app().await;
    let created = create(&app, json!({"title": "Blue", "artist": "Ana"})).await;
    let uri = format!("/songs/{}/rating", created["id"].as_str().unwrap());

    let (status, body) = send(&app, json_request("POST", &uri, &rating)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], code);

    let (_, summary) = send(&app, test_request("GET", &uri)).await;
    assert_eq!(summary["count"], 0);
}

// =============================================================================
// Average difficulty
// =============================================================================

#[tokio::test]
async fn test_average_difficulty_empty() {
    let app = setup_app().await;

    let (status, body) = send(&app, test_request("GET", "/songs/avg/difficulty")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_average_difficulty() {
    let app = setup_seeded_app().await;

    let (status, body) = send(&app, test_request("GET", "/songs/avg/difficulty")).await;
    assert_eq!(status, StatusCode::OK);
    let levels = body
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["level"].as_u64().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(levels, vec![3, 6, 9, 13]);

    let (status, body) = send(&app, test_request("GET", "/songs/avg/difficulty?level=6")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"level": 6, "average_difficulty": 6.0}]));

    let (status, body) = send(&app, test_request("GET", "/songs/avg/difficulty?level=11")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_average_difficulty_invalid_level() {
    let app = setup_seeded_app().await;

    let (status, body) = send(&app, test_request("GET", "/songs/avg/difficulty?level=fake")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["message"],
        "\"fake\" is not a valid argument for parameter \"level\""
    );
}
