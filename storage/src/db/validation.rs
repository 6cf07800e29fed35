//! Validation of untyped song documents received from the wire.
//!
//! Every write to the song table goes through one of the validated types produced here
//! ([`NewSong`] for creation, [`SongChangeSet`] for partial updates), raw json never reaches the database.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};

use super::schemas::song::{NewSong, RatingSummary, SongChangeSet};

/// Fields a client may supply.
const WRITABLE_FIELDS: [&str; 8] = [
    "title",
    "artist",
    "album",
    "duration_seconds",
    "tags",
    "level",
    "difficulty",
    "released",
];

/// Fields maintained by the store, clients may read but never write them.
const STORE_FIELDS: [&str; 2] = ["id", "ratings"];

/// Why a field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Reason {
    Missing,
    WrongType { expected: &'static str },
    Empty,
    Negative,
    OutOfRange,
    UnknownField,
    Immutable,
    NotAnObject,
}

impl std::fmt::Display for Reason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "field is required"),
            Self::WrongType { expected } => write!(f, "expected {expected}"),
            Self::Empty => write!(f, "must not be empty"),
            Self::Negative => write!(f, "must not be negative"),
            Self::OutOfRange => write!(f, "value is out of range"),
            Self::UnknownField => write!(f, "unknown field"),
            Self::Immutable => write!(f, "field is assigned by the store and cannot be written"),
            Self::NotAnObject => write!(f, "expected a json object"),
        }
    }
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    #[serde(flatten)]
    pub reason: Reason,
}

impl ValidationError {
    #[must_use]
    pub fn new(field: impl Into<String>, reason: Reason) -> Self {
        Self {
            field: field.into(),
            reason,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Every field rejected in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `field` was rejected.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl From<Vec<ValidationError>> for ValidationErrors {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self(errors)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// What a document said about one field.
enum Supplied<T> {
    Absent,
    Null,
    Value(T),
    Invalid,
}

/// Walks the fields of one document, collecting errors as it goes.
struct Document<'a> {
    object: &'a Map<String, Value>,
    errors: Vec<ValidationError>,
}

impl<'a> Document<'a> {
    fn new(input: &'a Value, writable: &[&str]) -> Result<Self, ValidationErrors> {
        let Value::Object(object) = input else {
            return Err(vec![ValidationError::new("$root", Reason::NotAnObject)].into());
        };

        let errors = object
            .keys()
            .filter(|key| !writable.contains(&key.as_str()))
            .map(|key| {
                let reason = if STORE_FIELDS.contains(&key.as_str()) {
                    Reason::Immutable
                } else {
                    Reason::UnknownField
                };
                ValidationError::new(key.as_str(), reason)
            })
            .collect();

        Ok(Self { object, errors })
    }

    fn field<T>(
        &mut self,
        name: &'static str,
        parse: impl FnOnce(&Value) -> Result<T, Reason>,
    ) -> Supplied<T> {
        match self.object.get(name) {
            None => Supplied::Absent,
            Some(Value::Null) => Supplied::Null,
            Some(value) => match parse(value) {
                Ok(parsed) => Supplied::Value(parsed),
                Err(reason) => {
                    self.errors.push(ValidationError::new(name, reason));
                    Supplied::Invalid
                }
            },
        }
    }

    /// A field that must be present on creation.
    fn required<T>(
        &mut self,
        name: &'static str,
        parse: impl FnOnce(&Value) -> Result<T, Reason>,
    ) -> Option<T> {
        match self.field(name, parse) {
            Supplied::Value(value) => Some(value),
            Supplied::Absent | Supplied::Null => {
                self.errors.push(ValidationError::new(name, Reason::Missing));
                None
            }
            Supplied::Invalid => None,
        }
    }

    /// An optional field on creation, `null` is the same as leaving it out.
    fn optional<T>(
        &mut self,
        name: &'static str,
        parse: impl FnOnce(&Value) -> Result<T, Reason>,
    ) -> Option<T> {
        match self.field(name, parse) {
            Supplied::Value(value) => Some(value),
            _ => None,
        }
    }

    /// A required field in a partial update, it may be left out but not cleared.
    fn replace<T>(
        &mut self,
        name: &'static str,
        expected: &'static str,
        parse: impl FnOnce(&Value) -> Result<T, Reason>,
    ) -> Option<T> {
        match self.field(name, parse) {
            Supplied::Value(value) => Some(value),
            Supplied::Null => {
                self.errors
                    .push(ValidationError::new(name, Reason::WrongType { expected }));
                None
            }
            Supplied::Absent | Supplied::Invalid => None,
        }
    }

    /// An optional field in a partial update, `null` clears it.
    fn replace_or_clear<T>(
        &mut self,
        name: &'static str,
        parse: impl FnOnce(&Value) -> Result<T, Reason>,
    ) -> Option<Option<T>> {
        match self.field(name, parse) {
            Supplied::Value(value) => Some(Some(value)),
            Supplied::Null => Some(None),
            Supplied::Absent | Supplied::Invalid => None,
        }
    }
}

fn text(value: &Value) -> Result<String, Reason> {
    let Value::String(s) = value else {
        return Err(Reason::WrongType { expected: "string" });
    };
    let trimmed = s.trim();
    if trimmed.is_empty() {
        Err(Reason::Empty)
    } else {
        Ok(trimmed.to_owned())
    }
}

/// A non-negative integer that fits the database's integer type comfortably.
fn count(value: &Value) -> Result<u32, Reason> {
    let Value::Number(n) = value else {
        return Err(Reason::WrongType { expected: "integer" });
    };
    if let Some(n) = n.as_u64() {
        u32::try_from(n).map_err(|_| Reason::OutOfRange)
    } else if n.as_i64().is_some() {
        Err(Reason::Negative)
    } else {
        Err(Reason::WrongType { expected: "integer" })
    }
}

fn difficulty(value: &Value) -> Result<f64, Reason> {
    let Some(n) = value.as_f64() else {
        return Err(Reason::WrongType { expected: "number" });
    };
    if !n.is_finite() {
        Err(Reason::OutOfRange)
    } else if n < 0.0 {
        Err(Reason::Negative)
    } else {
        Ok(n)
    }
}

fn tags(value: &Value) -> Result<BTreeSet<String>, Reason> {
    const EXPECTED: Reason = Reason::WrongType {
        expected: "array of strings",
    };
    let Value::Array(items) = value else {
        return Err(EXPECTED);
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(_) => text(item),
            _ => Err(EXPECTED),
        })
        .collect()
}

fn rating(value: &Value) -> Result<u8, Reason> {
    let rating = count(value)?;
    u8::try_from(rating)
        .ok()
        .filter(|r| (RatingSummary::MIN_RATING..=RatingSummary::MAX_RATING).contains(r))
        .ok_or(Reason::OutOfRange)
}

/// Validate the body of a rating, `{"rating": 1..=5}`.
///
/// # Errors
///
/// Returns an error if the rating is missing, not an integer, or out of range, or if the body has other fields.
pub fn validate_rating(input: &Value) -> Result<u8, ValidationErrors> {
    let mut doc = Document::new(input, &["rating"])?;
    match doc.required("rating", rating) {
        Some(rating) if doc.errors.is_empty() => Ok(rating),
        _ => Err(doc.errors.into()),
    }
}

impl NewSong {
    /// Validate a complete song document.
    ///
    /// # Errors
    ///
    /// Returns every field that is missing, malformed, unknown, or store-assigned.
    pub fn validate(input: &Value) -> Result<Self, ValidationErrors> {
        let mut doc = Document::new(input, &WRITABLE_FIELDS)?;

        let title = doc.required("title", text);
        let artist = doc.required("artist", text);
        let album = doc.optional("album", text);
        let duration_seconds = doc.optional("duration_seconds", count);
        let tags = doc.optional("tags", tags).unwrap_or_default();
        let level = doc.optional("level", count);
        let difficulty = doc.optional("difficulty", difficulty);
        let released = doc.optional("released", text);

        match (title, artist) {
            (Some(title), Some(artist)) if doc.errors.is_empty() => Ok(Self {
                title,
                artist,
                album,
                duration_seconds,
                tags,
                level,
                difficulty,
                released,
            }),
            _ => Err(doc.errors.into()),
        }
    }
}

impl SongChangeSet {
    /// Validate a partial song document.
    ///
    /// # Errors
    ///
    /// Returns every field that is malformed, unknown, or store-assigned,
    /// and any required field the document tries to clear.
    pub fn validate(input: &Value) -> Result<Self, ValidationErrors> {
        let mut doc = Document::new(input, &WRITABLE_FIELDS)?;

        let changes = Self {
            title: doc.replace("title", "string", text),
            artist: doc.replace("artist", "string", text),
            album: doc.replace_or_clear("album", text),
            duration_seconds: doc.replace_or_clear("duration_seconds", count),
            tags: doc
                .replace_or_clear("tags", tags)
                .map(Option::unwrap_or_default),
            level: doc.replace_or_clear("level", count),
            difficulty: doc.replace_or_clear("difficulty", difficulty),
            released: doc.replace_or_clear("released", text),
        };

        if doc.errors.is_empty() {
            Ok(changes)
        } else {
            Err(doc.errors.into())
        }
    }
}
