//! Queries over the song table.
//!
//! Filter values are never spliced into the query text, they are bound as `$artist` and `$title`.

use crate::db::{
    filter::{MatchMode, SongFilter},
    schemas::song::TABLE_NAME,
};

use super::generic::count_where;

/// The condition on one field of a song for the given filter semantics.
fn field_condition(field: &str, mode: MatchMode, case_sensitive: bool) -> String {
    let (field_expr, param_expr) = if case_sensitive {
        (field.to_string(), format!("${field}"))
    } else {
        (
            format!("string::lowercase({field})"),
            format!("string::lowercase(${field})"),
        )
    };

    match mode {
        MatchMode::Exact => format!("{field_expr} = {param_expr}"),
        MatchMode::Contains => format!("string::contains({field_expr}, {param_expr})"),
    }
}

/// The `WHERE` condition for a filter, `None` if the filter matches every song.
///
/// e.g. for a case-insensitive substring filter on the artist, compiles to:
/// ```sql, ignore
/// string::contains(string::lowercase(artist), string::lowercase($artist))
/// ```
#[must_use]
pub fn filter_condition(filter: &SongFilter) -> Option<String> {
    let conditions = [
        filter.artist.as_ref().map(|_| "artist"),
        filter.title.as_ref().map(|_| "title"),
    ]
    .into_iter()
    .flatten()
    .map(|field| field_condition(field, filter.match_mode, filter.case_sensitive))
    .collect::<Vec<_>>();

    (!conditions.is_empty()).then(|| conditions.join(" AND "))
}

/// Query to read one page of the songs matching a filter, in id order.
///
/// Compiles to:
/// ```sql, ignore
/// SELECT * FROM song WHERE condition ORDER BY id LIMIT $limit START $start
/// ```
#[must_use]
pub fn list(filter: &SongFilter) -> String {
    let condition = filter_condition(filter).map_or_else(String::new, |c| format!(" WHERE {c}"));
    format!("SELECT * FROM {TABLE_NAME}{condition} ORDER BY id LIMIT $limit START $start")
}

/// Query to count the songs matching a filter.
///
/// Compiles to:
/// ```sql, ignore
/// SELECT count() FROM song WHERE condition GROUP ALL
/// ```
#[must_use]
pub fn count_matching(filter: &SongFilter) -> String {
    filter_condition(filter).map_or_else(
        || super::generic::count(TABLE_NAME),
        |condition| count_where(TABLE_NAME, condition),
    )
}

/// Query to search the titles and artists of songs, best matches first.
///
/// Compiles to:
/// ```sql, ignore
/// SELECT *, search::score(0) * 2 + search::score(1) * 1 AS relevance FROM song WHERE title @0@ $query OR artist @1@ $query ORDER BY relevance DESC LIMIT $limit
/// ```
#[must_use]
pub fn search() -> String {
    format!(
        "SELECT *, search::score(0) * 2 + search::score(1) * 1 AS relevance FROM {TABLE_NAME} WHERE title @0@ $query OR artist @1@ $query ORDER BY relevance DESC LIMIT $limit"
    )
}

/// Query to append a rating to a song, returns nothing if the song doesn't exist.
///
/// Compiles to:
/// ```sql, ignore
/// UPDATE $id SET ratings = array::append(ratings, $rating)
/// ```
#[must_use]
pub fn add_rating() -> String {
    "UPDATE $id SET ratings = array::append(ratings, $rating)".to_string()
}

/// Query to average the difficulty of songs, grouped by level.
///
/// Compiles to:
/// ```sql, ignore
/// SELECT level, math::mean(difficulty) AS average_difficulty FROM song WHERE level != NONE AND difficulty != NONE GROUP BY level ORDER BY level
/// ```
///
/// or, when `by_level` is set, to the same query restricted with `AND level = $level`.
#[must_use]
pub fn average_difficulty(by_level: bool) -> String {
    let level_condition = if by_level { " AND level = $level" } else { "" };
    format!(
        "SELECT level, math::mean(difficulty) AS average_difficulty FROM {TABLE_NAME} WHERE level != NONE AND difficulty != NONE{level_condition} GROUP BY level ORDER BY level"
    )
}

/// Query to remove every song.
///
/// Compiles to:
/// ```sql, ignore
/// DELETE song
/// ```
#[must_use]
pub fn delete_all() -> String {
    format!("DELETE {TABLE_NAME}")
}
