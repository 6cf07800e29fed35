//! Request extractors that reject with the API error envelope.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
};
use serde_json::Value;

use super::errors::ApiError;

/// A request body that parsed as a json object.
///
/// Invalid json, a missing or wrong content type, and json that isn't an object are all rejected with
/// `400 bad_request` before the handler runs.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonObject(pub Value);

#[axum::async_trait]
impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        if value.is_object() {
            Ok(Self(value))
        } else {
            Err(ApiError::BadRequest(
                "the request body must be a json object".to_owned(),
            ))
        }
    }
}

/// The `:id` segment of a song path, as the client wrote it.
///
/// A segment that can't be decoded (e.g. invalid utf-8) is rejected with `400 bad_request`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongKey(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for SongKey
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(key) = Path::<String>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

        Ok(Self(key))
    }
}
