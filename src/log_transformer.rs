//! Activity-log transformer.
//!
//! A log file is parsed and filtered to `NextSong` events, then written in
//! two phases inside the caller's transaction:
//!
//! 1. dimensions: every `time` row, then every `users` row for the file;
//! 2. facts: one `songplays` row per event, resolved against the catalog.
//!
//! Songplays reference `time` and `users`, so phase 1 must finish for the
//! whole file before phase 2 starts; foreign keys are checked immediately.

use rusqlite::{params, Connection};
use rustc_hash::FxHashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::calendar;
use crate::error::{EtlError, Result};
use crate::models::{Level, LogEvent, Songplay, TimeBucket, User};
use crate::resolver;

const TIME_UPSERT: &str = "INSERT INTO \"time\" (start_time, hour, day, week, month, year, weekday)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT (start_time) DO NOTHING";

/// First-seen row wins; a later level change for the same user is not recorded.
const USER_UPSERT: &str = "INSERT INTO users (user_id, first_name, last_name, gender, level)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT (user_id) DO NOTHING";

/// No natural key: replaying a log file appends duplicate songplays.
const SONGPLAY_INSERT: &str = "INSERT INTO songplays
     (start_time, user_id, level, song_id, artist_id, session_id, location, user_agent)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

/// A song-play event with its catalog lookup still pending.
#[derive(Clone, Debug)]
pub struct PendingPlay {
    pub start_time: String,
    pub user_id: i64,
    pub level: Level,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
    pub song: Option<String>,
    pub artist: Option<String>,
    pub length: Option<f64>,
}

/// Everything one log file contributes, split by target table.
#[derive(Clone, Debug, Default)]
pub struct LogBatch {
    /// Distinct by `start_time`, in first-seen order.
    pub time_buckets: Vec<TimeBucket>,
    /// Distinct by `user_id`, first-seen row kept.
    pub users: Vec<User>,
    /// One per `NextSong` event, in file order.
    pub plays: Vec<PendingPlay>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogFileStats {
    pub events: usize,
    pub song_plays: usize,
    pub new_time_rows: usize,
    pub new_users: usize,
    pub resolved: usize,
}

/// Parse every non-blank line, paired with its 1-based line number in the file.
pub fn read_log_file(path: &Path) -> Result<Vec<(usize, LogEvent)>> {
    let content = fs::read_to_string(path).map_err(|source| EtlError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mut events = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let event: LogEvent = serde_json::from_str(line).map_err(|e| EtlError::Malformed {
            path: path.to_path_buf(),
            line: idx + 1,
            reason: e.to_string(),
        })?;
        events.push((idx + 1, event));
    }
    Ok(events)
}

fn malformed(path: &Path, line: usize, reason: String) -> EtlError {
    EtlError::Malformed {
        path: path.to_path_buf(),
        line,
        reason,
    }
}

/// Filter to song plays and derive the dimension and fact rows.
/// Other pages are dropped without looking at their fields. `path` and the
/// line numbers are only used to label errors.
pub fn transform_events(path: &Path, events: &[(usize, LogEvent)]) -> Result<LogBatch> {
    let mut batch = LogBatch::default();
    let mut seen_times: FxHashSet<String> = FxHashSet::default();
    let mut seen_users: FxHashSet<i64> = FxHashSet::default();

    for (line, event) in events {
        if !event.is_song_play() {
            continue;
        }
        let line = *line;
        let missing = |field: &str| malformed(path, line, format!("song play without {}", field));

        let ts = event.ts.ok_or_else(|| missing("ts"))?;
        let user_id = event.user_id.ok_or_else(|| missing("userId"))?;
        let session_id = event.session_id.ok_or_else(|| missing("sessionId"))?;
        let level: Level = event
            .level
            .as_deref()
            .ok_or_else(|| missing("level"))?
            .parse()
            .map_err(|reason| malformed(path, line, reason))?;

        let bucket = calendar::time_bucket(ts)?;
        let start_time = bucket.start_time.clone();
        if seen_times.insert(bucket.start_time.clone()) {
            batch.time_buckets.push(bucket);
        }

        if seen_users.insert(user_id) {
            batch.users.push(User {
                user_id,
                first_name: event.first_name.clone(),
                last_name: event.last_name.clone(),
                gender: event.gender.clone(),
                level,
            });
        }

        batch.plays.push(PendingPlay {
            start_time,
            user_id,
            level,
            session_id,
            location: event.location.clone(),
            user_agent: event.user_agent.clone(),
            song: event.song.clone(),
            artist: event.artist.clone(),
            length: event.length,
        });
    }
    Ok(batch)
}

fn insert_time_bucket(conn: &Connection, bucket: &TimeBucket) -> Result<usize> {
    let mut stmt = conn.prepare_cached(TIME_UPSERT)?;
    Ok(stmt.execute(params![
        bucket.start_time,
        bucket.hour,
        bucket.day,
        bucket.week,
        bucket.month,
        bucket.year,
        bucket.weekday,
    ])?)
}

fn insert_user(conn: &Connection, user: &User) -> Result<usize> {
    let mut stmt = conn.prepare_cached(USER_UPSERT)?;
    Ok(stmt.execute(params![
        user.user_id,
        user.first_name,
        user.last_name,
        user.gender,
        user.level.as_str(),
    ])?)
}

pub fn insert_songplay(conn: &Connection, play: &Songplay) -> Result<i64> {
    let mut stmt = conn.prepare_cached(SONGPLAY_INSERT)?;
    stmt.execute(params![
        play.start_time,
        play.user_id,
        play.level.as_str(),
        play.song_id,
        play.artist_id,
        play.session_id,
        play.location,
        play.user_agent,
    ])?;
    Ok(conn.last_insert_rowid())
}

/// Write a batch: all dimensions first, then all facts.
pub fn write_batch(conn: &Connection, batch: &LogBatch) -> Result<LogFileStats> {
    let mut stats = LogFileStats::default();

    for bucket in &batch.time_buckets {
        stats.new_time_rows += insert_time_bucket(conn, bucket)?;
    }
    for user in &batch.users {
        stats.new_users += insert_user(conn, user)?;
    }

    for pending in &batch.plays {
        let found = resolver::resolve_event(
            conn,
            pending.song.as_deref(),
            pending.artist.as_deref(),
            pending.length,
        )?;
        if found.is_some() {
            stats.resolved += 1;
        }
        let (song_id, artist_id) = match found {
            Some(m) => (Some(m.song_id), Some(m.artist_id)),
            None => (None, None),
        };
        insert_songplay(
            conn,
            &Songplay {
                start_time: pending.start_time.clone(),
                user_id: pending.user_id,
                level: pending.level,
                song_id,
                artist_id,
                session_id: pending.session_id,
                location: pending.location.clone(),
                user_agent: pending.user_agent.clone(),
            },
        )?;
        stats.song_plays += 1;
    }
    Ok(stats)
}

/// Load one activity-log file.
pub fn process_log_file(conn: &Connection, path: &Path) -> Result<LogFileStats> {
    let events = read_log_file(path)?;
    let batch = transform_events(path, &events)?;
    let mut stats = write_batch(conn, &batch)?;
    stats.events = events.len();
    debug!(
        path = %path.display(),
        events = stats.events,
        song_plays = stats.song_plays,
        resolved = stats.resolved,
        "loaded log file"
    );
    Ok(stats)
}
