//! Song-metadata loader: one song file becomes one artist upsert and one
//! song insert.

use rusqlite::{params, Connection};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

use crate::error::{EtlError, Result};
use crate::models::{Artist, Song, SongRecord};

const ARTIST_UPSERT: &str = "INSERT INTO artists (artist_id, name, location, latitude, longitude)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT (artist_id) DO NOTHING";

/// No conflict clause: a repeated song_id surfaces as a duplicate-key error.
const SONG_INSERT: &str = "INSERT INTO songs (song_id, title, artist_id, year, duration)
     VALUES (?1, ?2, ?3, ?4, ?5)";

pub fn read_song_file(path: &Path) -> Result<SongRecord> {
    let file = File::open(path).map_err(|source| EtlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| EtlError::Malformed {
        path: path.to_path_buf(),
        line: e.line(),
        reason: e.to_string(),
    })
}

/// Returns the number of artist rows actually inserted (0 when the artist
/// was already known).
pub fn insert_artist(conn: &Connection, artist: &Artist) -> Result<usize> {
    let mut stmt = conn.prepare_cached(ARTIST_UPSERT)?;
    let inserted = stmt.execute(params![
        artist.artist_id,
        artist.name,
        artist.location,
        artist.latitude,
        artist.longitude,
    ])?;
    Ok(inserted)
}

pub fn insert_song(conn: &Connection, song: &Song) -> Result<()> {
    let mut stmt = conn.prepare_cached(SONG_INSERT)?;
    stmt.execute(params![
        song.song_id,
        song.title,
        song.artist_id,
        song.year,
        song.duration,
    ])?;
    Ok(())
}

/// Load one song file. The artist goes in first so the song's foreign key
/// to `artists` is satisfied.
pub fn process_song_file(conn: &Connection, path: &Path) -> Result<()> {
    let record = read_song_file(path)?;
    insert_artist(conn, &Artist::from(&record))?;
    insert_song(conn, &Song::from(&record))?;
    debug!("Successfully inserted record for file: {}", path.display());
    Ok(())
}
