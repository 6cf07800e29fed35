use thiserror::Error;

use crate::db::validation::ValidationErrors;

#[derive(Error, Debug)]
pub enum Error {
    #[error("SurrealDB error: {0}")]
    DbError(surrealdb::Error),
    #[error("The song database is unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Item not found.")]
    NotFound,
    #[error("Item could not be created.")]
    NotCreated,
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("Invalid seed record on line {line}: {reason}")]
    InvalidSeed { line: usize, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<surrealdb::Error> for Error {
    fn from(err: surrealdb::Error) -> Self {
        match err {
            // the client never reached the database, or lost its socket
            surrealdb::Error::Api(
                api @ (surrealdb::error::Api::ConnectionUninitialised
                | surrealdb::error::Api::Ws(_)),
            ) => Self::StoreUnavailable(api.to_string()),
            err => Self::DbError(err),
        }
    }
}
