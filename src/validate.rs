use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::entity::song::Genre;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub path: Vec<String>,
    pub message: String,
}

impl Issue {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Issue {
            path: if field.is_empty() {
                vec![]
            } else {
                vec![field.to_string()]
            },
            message: message.into(),
        }
    }

    /// An issue concerning the payload as a whole.
    pub fn body(message: impl Into<String>) -> Self {
        Issue::new("", message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("validation failed with {} issue(s)", .0.len())]
pub struct ValidationIssues(Vec<Issue>);

impl ValidationIssues {
    pub fn issues(&self) -> &[Issue] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn push(&mut self, issue: Issue) {
        self.0.push(issue);
    }
}

impl From<Issue> for ValidationIssues {
    fn from(issue: Issue) -> Self {
        ValidationIssues(vec![issue])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSong {
    pub(crate) title: String,
    pub(crate) artist: String,
    pub(crate) album: String,
    pub(crate) genre: Genre,
    pub(crate) release_date: NaiveDate,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SongPatch {
    pub(crate) title: Option<String>,
    pub(crate) artist: Option<String>,
    pub(crate) album: Option<String>,
    pub(crate) genre: Option<Genre>,
    pub(crate) release_date: Option<NaiveDate>,
}

impl SongPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.artist.is_none()
            && self.album.is_none()
            && self.genre.is_none()
            && self.release_date.is_none()
    }
}

struct TextField {
    key: &'static str,
    label: &'static str,
    max: usize,
}

const TITLE: TextField = TextField {
    key: "title",
    label: "Title",
    max: 100,
};
const ARTIST: TextField = TextField {
    key: "artist",
    label: "Artist",
    max: 50,
};
const ALBUM: TextField = TextField {
    key: "album",
    label: "Album",
    max: 100,
};
const GENRE: &str = "genre";
const RELEASE_DATE: &str = "releaseDate";

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Strict,
    Partial,
}

pub fn validate_new(payload: &Value) -> Result<NewSong, ValidationIssues> {
    let fields = Fields::check(payload, Mode::Strict)?;
    match fields {
        Fields {
            title: Some(title),
            artist: Some(artist),
            album: Some(album),
            genre: Some(genre),
            release_date: Some(release_date),
        } => Ok(NewSong {
            title,
            artist,
            album,
            genre,
            release_date,
        }),
        // strict mode already reported every missing field
        _ => Err(Issue::body("Incomplete song").into()),
    }
}

pub fn validate_patch(payload: &Value) -> Result<SongPatch, ValidationIssues> {
    let fields = Fields::check(payload, Mode::Partial)?;
    Ok(SongPatch {
        title: fields.title,
        artist: fields.artist,
        album: fields.album,
        genre: fields.genre,
        release_date: fields.release_date,
    })
}

#[derive(Default)]
struct Fields {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    genre: Option<Genre>,
    release_date: Option<NaiveDate>,
}

impl Fields {
    fn check(payload: &Value, mode: Mode) -> Result<Self, ValidationIssues> {
        let Value::Object(map) = payload else {
            return Err(Issue::body(format!(
                "Expected object, received {}",
                type_name(payload)
            ))
            .into());
        };

        let mut issues = ValidationIssues::default();
        let fields = Fields {
            title: text(map, &TITLE, mode, &mut issues),
            artist: text(map, &ARTIST, mode, &mut issues),
            album: text(map, &ALBUM, mode, &mut issues),
            genre: genre(map, mode, &mut issues),
            release_date: release_date(map, mode, &mut issues),
        };

        if issues.is_empty() {
            Ok(fields)
        } else {
            Err(issues)
        }
    }
}

fn text(
    map: &Map<String, Value>,
    field: &TextField,
    mode: Mode,
    issues: &mut ValidationIssues,
) -> Option<String> {
    let value = match map.get(field.key) {
        Some(value) => value,
        None if mode == Mode::Partial => return None,
        None => {
            issues.push(Issue::new(field.key, format!("{} is required", field.label)));
            return None;
        }
    };

    let Value::String(s) = value else {
        issues.push(Issue::new(
            field.key,
            format!("Expected string, received {}", type_name(value)),
        ));
        return None;
    };

    let len = s.chars().count();
    if len == 0 {
        issues.push(Issue::new(field.key, format!("{} is required", field.label)));
        None
    } else if len > field.max {
        issues.push(Issue::new(
            field.key,
            format!("{} must be {} characters or less", field.label, field.max),
        ));
        None
    } else {
        Some(s.clone())
    }
}

fn genre(map: &Map<String, Value>, mode: Mode, issues: &mut ValidationIssues) -> Option<Genre> {
    let value = match map.get(GENRE) {
        Some(value) => value,
        None if mode == Mode::Partial => return None,
        None => {
            issues.push(Issue::new(GENRE, "Invalid genre"));
            return None;
        }
    };

    match value.as_str().map(str::parse::<Genre>) {
        Some(Ok(genre)) => Some(genre),
        _ => {
            issues.push(Issue::new(GENRE, "Invalid genre"));
            None
        }
    }
}

fn release_date(
    map: &Map<String, Value>,
    mode: Mode,
    issues: &mut ValidationIssues,
) -> Option<NaiveDate> {
    let value = match map.get(RELEASE_DATE) {
        Some(value) => value,
        None if mode == Mode::Partial => return None,
        None => {
            issues.push(Issue::new(RELEASE_DATE, "Invalid release date"));
            return None;
        }
    };

    let date = match value {
        Value::String(s) => parse_date(s),
        // epoch milliseconds
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.date_naive())
            .filter(four_digit_year),
        _ => None,
    };
    if date.is_none() {
        issues.push(Issue::new(RELEASE_DATE, "Invalid release date"));
    }
    date
}

/// Accepts `YYYY-MM-DD`, RFC 3339 date-times (taken in UTC) and naive
/// `YYYY-MM-DDTHH:MM:SS[.fff]` date-times.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).date_naive())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
        .filter(four_digit_year)
}

// dates are stored as text and ordered as strings
fn four_digit_year(date: &NaiveDate) -> bool {
    (0..=9999).contains(&date.year())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
