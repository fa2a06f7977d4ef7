//! Links a play event's free-text song, artist and length to catalog ids.
//!
//! Matching is exact on all three, duration included. A length that differs
//! from the catalog duration by any amount, however small, does not match,
//! and the event is stored unresolved. No rounding is applied.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::CatalogMatch;

const SONG_SELECT: &str = "SELECT s.song_id, a.artist_id
     FROM songs s
     JOIN artists a ON s.artist_id = a.artist_id
     WHERE s.title = ?1 AND a.name = ?2 AND s.duration = ?3
     LIMIT 1";

/// First catalog entry matching exactly, or `None`. A miss is not an error.
pub fn resolve(
    conn: &Connection,
    title: &str,
    artist_name: &str,
    duration: f64,
) -> Result<Option<CatalogMatch>> {
    let mut stmt = conn.prepare_cached(SONG_SELECT)?;
    let found = stmt
        .query_row(params![title, artist_name, duration], |row| {
            Ok(CatalogMatch {
                song_id: row.get(0)?,
                artist_id: row.get(1)?,
            })
        })
        .optional()?;
    Ok(found)
}

/// Like [`resolve`], for event fields that may be absent. Any missing field
/// means the event cannot be resolved.
pub fn resolve_event(
    conn: &Connection,
    title: Option<&str>,
    artist_name: Option<&str>,
    duration: Option<f64>,
) -> Result<Option<CatalogMatch>> {
    match (title, artist_name, duration) {
        (Some(title), Some(artist_name), Some(duration)) => {
            resolve(conn, title, artist_name, duration)
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Artist, Song};
    use crate::song_loader::{insert_artist, insert_song};
    use crate::{schema, store};

    fn catalog() -> Connection {
        let conn = store::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        insert_artist(
            &conn,
            &Artist {
                artist_id: "AR_TEST".to_string(),
                name: "Test Artist".to_string(),
                location: None,
                latitude: None,
                longitude: None,
            },
        )
        .unwrap();
        insert_song(
            &conn,
            &Song {
                song_id: "SO_TEST".to_string(),
                title: "Test Song".to_string(),
                artist_id: "AR_TEST".to_string(),
                year: 2001,
                duration: 200.5,
            },
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_exact_match_resolves() {
        let conn = catalog();
        let found = resolve(&conn, "Test Song", "Test Artist", 200.5).unwrap();
        assert_eq!(
            found,
            Some(CatalogMatch {
                song_id: "SO_TEST".to_string(),
                artist_id: "AR_TEST".to_string(),
            })
        );
    }

    #[test]
    fn test_near_miss_duration_is_unresolved() {
        let conn = catalog();
        assert_eq!(resolve(&conn, "Test Song", "Test Artist", 200.50001).unwrap(), None);
    }

    #[test]
    fn test_title_and_artist_must_match_exactly() {
        let conn = catalog();
        assert_eq!(resolve(&conn, "test song", "Test Artist", 200.5).unwrap(), None);
        assert_eq!(resolve(&conn, "Test Song", "Other Artist", 200.5).unwrap(), None);
    }

    #[test]
    fn test_missing_event_field_is_unresolved() {
        let conn = catalog();
        assert_eq!(
            resolve_event(&conn, Some("Test Song"), Some("Test Artist"), None).unwrap(),
            None
        );
        assert!(resolve_event(&conn, Some("Test Song"), Some("Test Artist"), Some(200.5))
            .unwrap()
            .is_some());
    }
}
