//! Errors returned by the HTTP API, and how they are rendered.
//!
//! Every error body has the shape `{"error": {"code", "message", "fields"?}}`.

use axum::{
    Json,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use log::{error, warn};
use serde_json::json;

use songbook_storage::{db::validation::ValidationErrors, errors::Error as StoreError};

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("the request body failed validation")]
    Validation(ValidationErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("argument \"{0}\" is required")]
    MissingParameter(&'static str),
    #[error("song_id \"{0}\" not found")]
    SongNotFound(String),
    #[error("no route for {method} {path}")]
    RouteNotFound { method: Method, path: String },
    #[error("the song database is unavailable, try again later")]
    StoreUnavailable,
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    /// A query parameter that was supplied but can't be used.
    #[must_use]
    pub fn invalid_parameter(parameter: &str, value: &str) -> Self {
        Self::BadRequest(format!(
            "\"{value}\" is not a valid argument for parameter \"{parameter}\""
        ))
    }

    /// Map a store error that didn't concern a particular song.
    ///
    /// The detail of store faults is logged here and never sent to the client.
    #[must_use]
    pub fn store(err: StoreError) -> Self {
        match err {
            StoreError::Validation(errors) => Self::Validation(errors),
            StoreError::StoreUnavailable(detail) => {
                warn!("Song database unavailable: {detail}");
                Self::StoreUnavailable
            }
            other => {
                error!("Song database error: {other}");
                Self::Internal
            }
        }
    }

    /// Map a store error raised while working on the song with key `key`.
    #[must_use]
    pub fn song(err: StoreError, key: &str) -> Self {
        match err {
            StoreError::NotFound => Self::SongNotFound(key.to_owned()),
            other => Self::store(other),
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) | Self::MissingParameter(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::SongNotFound(_) | Self::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            Self::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::BadRequest(_) => "bad_request",
            Self::MissingParameter(_) => "missing_parameter",
            Self::SongNotFound(_) => "song_not_found",
            Self::RouteNotFound { .. } => "route_not_found",
            Self::StoreUnavailable => "store_unavailable",
            Self::Internal => "internal_error",
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "code": self.code(),
            "message": self.to_string(),
        });
        if let Self::Validation(errors) = &self {
            body["fields"] = json!(errors);
        }

        (self.status(), Json(json!({ "error": body }))).into_response()
    }
}

/// Fallback for paths, and methods on known paths, that nothing handles.
pub async fn route_not_found(method: Method, uri: Uri) -> ApiError {
    ApiError::RouteNotFound {
        method,
        path: uri.path().to_owned(),
    }
}
