//! Core data models for the Sparkify ETL.
//!
//! Raw input shapes (what the JSON files contain) live next to the row types
//! written to the store; conversions between them are plain `From` impls or
//! small fallible constructors when the input can be malformed.

use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// The `page` value that marks a song-play event in the activity log.
pub const NEXT_SONG_PAGE: &str = "NextSong";

// ============================================================================
// Input Models
// ============================================================================

/// One song-metadata file: a single JSON object.
#[derive(Clone, Debug, Deserialize)]
pub struct SongRecord {
    #[serde(default)]
    pub num_songs: Option<i64>,
    pub artist_id: String,
    pub artist_latitude: Option<f64>,
    pub artist_longitude: Option<f64>,
    #[serde(default)]
    pub artist_location: Option<String>,
    pub artist_name: String,
    pub song_id: String,
    pub title: String,
    pub duration: f64,
    /// 0 when the release year is unknown
    pub year: i32,
}

/// One line of an activity-log file.
///
/// Everything except `page` is optional here: only song plays need a full
/// record, and that is checked after filtering.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    pub ts: Option<i64>,
    #[serde(default)]
    pub page: String,
    #[serde(default, deserialize_with = "deserialize_user_id")]
    pub user_id: Option<i64>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
    pub song: Option<String>,
    pub artist: Option<String>,
    pub length: Option<f64>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl LogEvent {
    pub fn is_song_play(&self) -> bool {
        self.page == NEXT_SONG_PAGE
    }
}

/// `userId` shows up as `"39"`, `39`, or `""` for logged-out sessions.
fn deserialize_user_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Text(String),
    }

    match Option::<RawId>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawId::Int(id)) => Ok(Some(id)),
        Some(RawId::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse().map(Some).map_err(serde::de::Error::custom)
            }
        }
    }
}

// ============================================================================
// Row Models
// ============================================================================

/// Subscription tier of a user at the time of an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Free,
    Paid,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Free => "free",
            Level::Paid => "paid",
        }
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Level::Free),
            "paid" => Ok(Level::Paid),
            other => Err(format!("unknown level '{}'", other)),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Song {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    pub duration: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Artist {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<&SongRecord> for Song {
    fn from(r: &SongRecord) -> Self {
        Song {
            song_id: r.song_id.clone(),
            title: r.title.clone(),
            artist_id: r.artist_id.clone(),
            year: r.year,
            duration: r.duration,
        }
    }
}

impl From<&SongRecord> for Artist {
    fn from(r: &SongRecord) -> Self {
        Artist {
            artist_id: r.artist_id.clone(),
            name: r.artist_name.clone(),
            location: r.artist_location.clone(),
            latitude: r.artist_latitude,
            longitude: r.artist_longitude,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Level,
}

/// Calendar breakdown of one event timestamp. Keyed by `start_time`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimeBucket {
    /// UTC, `YYYY-MM-DD HH:MM:SS.mmm`
    pub start_time: String,
    pub hour: u32,
    pub day: u32,
    pub week: u32,
    pub month: u32,
    pub year: i32,
    pub weekday: String,
}

/// Fact row; `songplay_id` is assigned by the store on insert.
#[derive(Clone, Debug, PartialEq)]
pub struct Songplay {
    pub start_time: String,
    pub user_id: i64,
    pub level: Level,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// Catalog identifiers a play event resolved to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogMatch {
    pub song_id: String,
    pub artist_id: String,
}
