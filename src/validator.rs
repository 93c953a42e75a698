// Song payload validation
use chrono::{Datelike, Utc};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::song::{NewSong, Ratings, RatingsPatch, SongPatch};

/// Largest integer a JSON client can round-trip exactly (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

const SONG_KEYS: &[&str] = &["title", "genre", "artist", "released_year", "ratings"];
const RATINGS_KEYS: &[&str] = &["rym", "ranked"];

/// First failing field of a payload.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, detail: impl AsRef<str>) -> Self {
        Self {
            field: field.to_string(),
            message: format!("\"{}\" {}", field, detail.as_ref()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Presence {
    Required,
    Optional,
}

#[derive(Debug, Clone, Copy)]
pub struct SongValidator {
    max_year: i64,
}

impl SongValidator {
    /// Validator whose year ceiling is the current UTC calendar year.
    pub fn current() -> Self {
        Self::with_max_year(Utc::now().year() as i64)
    }

    pub fn with_max_year(max_year: i64) -> Self {
        Self { max_year }
    }

    pub fn validate_create(&self, payload: &Value) -> Result<NewSong, ValidationError> {
        let fields = as_object("value", payload)?;
        let required = Presence::Required;

        let title = present(string_field(fields, "title", required)?, "title")?;
        let genre = present(string_field(fields, "genre", required)?, "genre")?;
        let artist = present(string_field(fields, "artist", required)?, "artist")?;
        let released_year = present(self.year_field(fields, required)?, "released_year")?;
        let ratings = present(ratings_field(fields, required)?, "ratings")?;
        reject_unknown(fields, SONG_KEYS, None)?;

        Ok(NewSong {
            title,
            genre,
            artist,
            released_year,
            ratings: Ratings {
                rym: present(ratings.rym, "ratings.rym")?,
                ranked: present(ratings.ranked, "ratings.ranked")?,
            },
        })
    }

    pub fn validate_update(&self, payload: &Value) -> Result<SongPatch, ValidationError> {
        let fields = as_object("value", payload)?;
        let optional = Presence::Optional;

        let patch = SongPatch {
            title: string_field(fields, "title", optional)?,
            genre: string_field(fields, "genre", optional)?,
            artist: string_field(fields, "artist", optional)?,
            released_year: self.year_field(fields, optional)?,
            ratings: ratings_field(fields, optional)?,
        };
        reject_unknown(fields, SONG_KEYS, None)?;
        Ok(patch)
    }

    fn year_field(
        &self,
        fields: &Map<String, Value>,
        presence: Presence,
    ) -> Result<Option<i64>, ValidationError> {
        let year = integer_field(fields, "released_year", "released_year", presence)?;
        if let Some(year) = year {
            if year > self.max_year {
                return Err(ValidationError::new(
                    "released_year",
                    format!("must be less than or equal to {}", self.max_year),
                ));
            }
        }
        Ok(year)
    }
}

/// Validates a create payload against the current year.
pub fn validate_create(payload: &Value) -> Result<NewSong, ValidationError> {
    SongValidator::current().validate_create(payload)
}

/// Validates a partial update payload against the current year.
pub fn validate_update(payload: &Value) -> Result<SongPatch, ValidationError> {
    SongValidator::current().validate_update(payload)
}

fn as_object<'a>(path: &str, value: &'a Value) -> Result<&'a Map<String, Value>, ValidationError> {
    value
        .as_object()
        .ok_or_else(|| ValidationError::new(path, "must be of type object"))
}

fn present<T>(value: Option<T>, path: &str) -> Result<T, ValidationError> {
    value.ok_or_else(|| ValidationError::new(path, "is required"))
}

fn lookup<'a>(
    fields: &'a Map<String, Value>,
    key: &str,
    path: &str,
    presence: Presence,
) -> Result<Option<&'a Value>, ValidationError> {
    match (fields.get(key), presence) {
        (Some(value), _) => Ok(Some(value)),
        (None, Presence::Required) => Err(ValidationError::new(path, "is required")),
        (None, Presence::Optional) => Ok(None),
    }
}

fn string_field(
    fields: &Map<String, Value>,
    key: &str,
    presence: Presence,
) -> Result<Option<String>, ValidationError> {
    match lookup(fields, key, key, presence)? {
        None => Ok(None),
        Some(Value::String(s)) if s.is_empty() => {
            Err(ValidationError::new(key, "is not allowed to be empty"))
        }
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ValidationError::new(key, "must be a string")),
    }
}

/// Accepts JSON numbers and numeric strings within the safe range.
fn coerce_number(path: &str, value: &Value) -> Result<f64, ValidationError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    };
    let number = number.ok_or_else(|| ValidationError::new(path, "must be a number"))?;
    check_safe(path, number)?;
    if let Value::String(s) = value {
        if !survives_conversion(s, number) {
            return Err(ValidationError::new(path, "must be a safe number"));
        }
    }
    Ok(number)
}

/// Whether a plain decimal string reads back unchanged from its parsed value.
/// Exponent notation is only range-checked.
fn survives_conversion(raw: &str, number: f64) -> bool {
    let raw = raw.trim();
    if number == 0.0 || raw.contains(['e', 'E']) {
        return true;
    }
    let (sign, digits) = match raw.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", raw.strip_prefix('+').unwrap_or(raw)),
    };
    let (int, frac) = digits.split_once('.').unwrap_or((digits, ""));
    let int = match int.trim_start_matches('0') {
        "" => "0",
        int => int,
    };
    let normalized = match frac.trim_end_matches('0') {
        "" => format!("{sign}{int}"),
        frac => format!("{sign}{int}.{frac}"),
    };
    normalized == number.to_string()
}

fn number_field(
    fields: &Map<String, Value>,
    key: &str,
    path: &str,
    presence: Presence,
) -> Result<Option<f64>, ValidationError> {
    lookup(fields, key, path, presence)?
        .map(|value| coerce_number(path, value))
        .transpose()
}

fn integer_field(
    fields: &Map<String, Value>,
    key: &str,
    path: &str,
    presence: Presence,
) -> Result<Option<i64>, ValidationError> {
    let Some(value) = lookup(fields, key, path, presence)? else {
        return Ok(None);
    };
    if let Value::Number(n) = value {
        if let Some(i) = n.as_i64() {
            return check_safe(path, i as f64).map(|_| Some(i));
        }
    }
    let number = coerce_number(path, value)?;
    if number.fract() != 0.0 {
        return Err(ValidationError::new(path, "must be an integer"));
    }
    check_safe(path, number)?;
    Ok(Some(number as i64))
}

fn check_safe(path: &str, number: f64) -> Result<(), ValidationError> {
    if number.abs() > MAX_SAFE_INTEGER {
        return Err(ValidationError::new(path, "must be a safe number"));
    }
    Ok(())
}

fn ratings_field(
    fields: &Map<String, Value>,
    presence: Presence,
) -> Result<Option<RatingsPatch>, ValidationError> {
    let Some(value) = lookup(fields, "ratings", "ratings", presence)? else {
        return Ok(None);
    };
    let ratings = as_object("ratings", value)?;
    let patch = RatingsPatch {
        rym: number_field(ratings, "rym", "ratings.rym", presence)?,
        ranked: integer_field(ratings, "ranked", "ratings.ranked", presence)?,
    };
    reject_unknown(ratings, RATINGS_KEYS, Some("ratings"))?;
    Ok(Some(patch))
}

fn reject_unknown(
    fields: &Map<String, Value>,
    known: &[&str],
    parent: Option<&str>,
) -> Result<(), ValidationError> {
    match fields.keys().find(|key| !known.contains(&key.as_str())) {
        Some(key) => {
            let path = match parent {
                Some(parent) => format!("{}.{}", parent, key),
                None => key.clone(),
            };
            Err(ValidationError::new(&path, "is not allowed"))
        }
        None => Ok(()),
    }
}
