//! One-shot administrative setup of the song table: schema, indices, and seed data.
//!
//! Nothing here is reachable from request handling.

use std::path::Path;

use log::info;
use surrealdb::{Connection, Surreal, sql::Tokenizer};
use tracing::instrument;

use crate::{
    db::{
        crud::SongStore,
        queries::define_analyzer,
        schemas::song::{NewSong, TABLE_NAME},
    },
    errors::Error,
};

/// The analyzer backing full text search, case and diacritic insensitive.
pub const TEXT_ANALYZER: &str = "song_text";

/// Fields and their declared types, in declaration order.
const FIELDS: [(&str, &str); 9] = [
    ("title", "string ASSERT string::len(string::trim($value)) > 0"),
    ("artist", "string ASSERT string::len(string::trim($value)) > 0"),
    ("album", "option<string>"),
    ("duration_seconds", "option<int> ASSERT $value = NONE OR $value >= 0"),
    ("tags", "set<string> DEFAULT []"),
    ("level", "option<int> ASSERT $value = NONE OR $value >= 0"),
    ("difficulty", "option<float> ASSERT $value = NONE OR $value >= 0"),
    ("released", "option<string>"),
    ("ratings", "array<int> DEFAULT []"),
];

/// Fields with an index, and whether they get a full text index as well.
const INDEXED_FIELDS: [&str; 2] = ["artist", "title"];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexKind {
    Normal,
    Text,
}

impl IndexKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Text => "text",
        }
    }
}

/// Name of the index of `kind` on `field` of the song table.
#[must_use]
pub fn index_name(field: &str, kind: IndexKind) -> String {
    format!("{TABLE_NAME}_{field}_{}_index", kind.as_str())
}

/// The statements declaring the song table, grouped into transactions.
///
/// Every statement is `IF NOT EXISTS`, so running them against an already provisioned database changes nothing.
#[must_use]
pub fn schema_statements() -> Vec<String> {
    let mut statements = vec![
        "BEGIN;".to_string(),
        format!("DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;"),
        "COMMIT;".to_string(),
        "BEGIN;".to_string(),
    ];

    statements.extend(FIELDS.iter().map(|(field, kind)| {
        format!("DEFINE FIELD IF NOT EXISTS {field} ON {TABLE_NAME} TYPE {kind};")
    }));
    statements.push("COMMIT;".to_string());

    statements.push("BEGIN;".to_string());
    statements.push(format!(
        "{};",
        define_analyzer(
            TEXT_ANALYZER,
            Some(Tokenizer::Class),
            &["ascii", "lowercase"]
        )
    ));
    for field in INDEXED_FIELDS {
        statements.push(format!(
            "DEFINE INDEX IF NOT EXISTS {} ON {TABLE_NAME} FIELDS {field};",
            index_name(field, IndexKind::Normal)
        ));
        statements.push(format!(
            "DEFINE INDEX IF NOT EXISTS {} ON {TABLE_NAME} FIELDS {field} SEARCH ANALYZER {TEXT_ANALYZER} BM25;",
            index_name(field, IndexKind::Text)
        ));
    }
    statements.push("COMMIT;".to_string());

    statements
}

/// Declare the song table, its fields, and its indices.
///
/// # Errors
///
/// Returns an error if any statement is rejected by the database.
#[instrument]
pub async fn declare_schema<C: Connection>(db: &Surreal<C>) -> Result<(), Error> {
    db.query(schema_statements().join("\n")).await?.check()?;

    info!(
        "Declared the {TABLE_NAME} table with indices {}",
        INDEXED_FIELDS
            .iter()
            .flat_map(|f| [index_name(f, IndexKind::Normal), index_name(f, IndexKind::Text)])
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

/// What to do with songs already in the table when seeding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SeedMode {
    /// Keep existing songs, add the seed records next to them.
    #[default]
    Append,
    /// Remove every song first, leaving exactly the seed records.
    Replace,
}

/// Parse seed records, one json song object per line.
///
/// Blank lines are skipped. Every record goes through validation, and the first bad line fails the whole seed.
///
/// # Errors
///
/// Returns [`Error::InvalidSeed`] with the (1-based) number of the first line that isn't a valid song.
pub fn parse_seed(input: &str) -> Result<Vec<NewSong>, Error> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let line_number = index + 1;
            let value: serde_json::Value =
                serde_json::from_str(line).map_err(|e| Error::InvalidSeed {
                    line: line_number,
                    reason: e.to_string(),
                })?;
            NewSong::validate(&value).map_err(|e| Error::InvalidSeed {
                line: line_number,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Read and parse a seed file, see [`parse_seed`].
///
/// # Errors
///
/// Returns [`Error::Io`] if the file can't be read, or [`Error::InvalidSeed`] for the first bad line.
pub fn read_seed(path: &Path) -> Result<Vec<NewSong>, Error> {
    let records = parse_seed(&std::fs::read_to_string(path)?)?;
    info!("Read {} seed records from {}", records.len(), path.display());
    Ok(records)
}

/// Load already validated seed records, returning how many were stored.
///
/// # Errors
///
/// Returns an error if clearing the table or storing any record fails.
#[instrument(skip(records), fields(records = records.len()))]
pub async fn load_seed<C: Connection>(
    store: &SongStore<C>,
    records: Vec<NewSong>,
    mode: SeedMode,
) -> Result<usize, Error> {
    if mode == SeedMode::Replace {
        let removed = store.count().await?;
        store.clear().await?;
        info!("Removed {removed} existing songs before seeding");
    }

    let mut loaded = 0;
    for record in records {
        store.insert(record).await?;
        loaded += 1;
    }

    info!("Seeded {loaded} songs");
    Ok(loaded)
}
