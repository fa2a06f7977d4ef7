//! Table layouts for the star schema and the admin operations over them.
//!
//! `songplays` is the fact table; `artists`, `songs`, `users` and `time` are
//! its dimensions. `songs.artist_id` also references `artists`.

use rusqlite::{params, Connection};
use tracing::{debug, info};

use crate::error::{EtlError, Result};

pub struct Table {
    pub name: &'static str,
    pub schema: &'static str,
    pub indices: &'static [&'static str],
}

impl Table {
    fn drop_statement(&self) -> String {
        format!("DROP TABLE IF EXISTS \"{}\"", self.name)
    }
}

pub const ARTISTS_TABLE: Table = Table {
    name: "artists",
    schema: "CREATE TABLE IF NOT EXISTS artists (
        artist_id TEXT NOT NULL CONSTRAINT artist_primary PRIMARY KEY,
        name TEXT,
        location TEXT,
        latitude REAL,
        longitude REAL
    )",
    indices: &["CREATE INDEX IF NOT EXISTS artists_name_index ON artists (name)"],
};

pub const SONGS_TABLE: Table = Table {
    name: "songs",
    schema: "CREATE TABLE IF NOT EXISTS songs (
        song_id TEXT NOT NULL CONSTRAINT song_primary PRIMARY KEY,
        title TEXT,
        artist_id TEXT REFERENCES artists (artist_id),
        year INTEGER CHECK (year >= 0),
        duration REAL
    )",
    indices: &["CREATE INDEX IF NOT EXISTS songs_title_index ON songs (title)"],
};

pub const USERS_TABLE: Table = Table {
    name: "users",
    schema: "CREATE TABLE IF NOT EXISTS users (
        user_id INTEGER CONSTRAINT user_primary PRIMARY KEY,
        first_name TEXT,
        last_name TEXT,
        gender TEXT CHECK (gender IS NULL OR length(gender) <= 1),
        level TEXT NOT NULL CHECK (level IN ('free', 'paid'))
    )",
    indices: &[],
};

pub const TIME_TABLE: Table = Table {
    name: "time",
    schema: "CREATE TABLE IF NOT EXISTS \"time\" (
        start_time TEXT NOT NULL CONSTRAINT time_primary PRIMARY KEY,
        hour INTEGER NOT NULL CHECK (hour BETWEEN 0 AND 23),
        day INTEGER NOT NULL CHECK (day BETWEEN 1 AND 31),
        week INTEGER NOT NULL CHECK (week BETWEEN 1 AND 53),
        month INTEGER NOT NULL CHECK (month BETWEEN 1 AND 12),
        year INTEGER NOT NULL CHECK (year >= 0),
        weekday TEXT NOT NULL
    )",
    indices: &[],
};

pub const SONGPLAYS_TABLE: Table = Table {
    name: "songplays",
    schema: "CREATE TABLE IF NOT EXISTS songplays (
        songplay_id INTEGER CONSTRAINT songplay_primary PRIMARY KEY AUTOINCREMENT,
        start_time TEXT NOT NULL REFERENCES \"time\" (start_time),
        user_id INTEGER NOT NULL REFERENCES users (user_id),
        level TEXT NOT NULL,
        song_id TEXT REFERENCES songs (song_id),
        artist_id TEXT REFERENCES artists (artist_id),
        session_id INTEGER NOT NULL,
        location TEXT,
        user_agent TEXT
    )",
    indices: &[
        "CREATE INDEX IF NOT EXISTS songplays_user_index ON songplays (user_id)",
        "CREATE INDEX IF NOT EXISTS songplays_start_time_index ON songplays (start_time)",
    ],
};

/// Creation order; referenced tables come before the tables referencing them.
pub const TABLES: &[Table] = &[
    ARTISTS_TABLE,
    SONGS_TABLE,
    USERS_TABLE,
    TIME_TABLE,
    SONGPLAYS_TABLE,
];

pub fn create_tables(conn: &Connection) -> Result<()> {
    for table in TABLES {
        debug!(table = table.name, "creating table");
        conn.execute_batch(table.schema)?;
        for index in table.indices {
            conn.execute_batch(index)?;
        }
    }
    info!("created {} tables", TABLES.len());
    Ok(())
}

/// Drops in reverse creation order so no foreign key is left dangling.
pub fn drop_tables(conn: &Connection) -> Result<()> {
    for table in TABLES.iter().rev() {
        debug!(table = table.name, "dropping table");
        conn.execute_batch(&table.drop_statement())?;
    }
    Ok(())
}

/// Drop-if-exists then create: the idempotent admin reset.
pub fn reset(conn: &Connection) -> Result<()> {
    drop_tables(conn)?;
    create_tables(conn)
}

fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Fails with [`EtlError::SchemaMissing`] naming every absent table.
pub fn verify_schema(conn: &Connection) -> Result<()> {
    let mut missing = Vec::new();
    for table in TABLES {
        if !table_exists(conn, table.name)? {
            missing.push(table.name);
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(EtlError::SchemaMissing { tables: missing })
    }
}

/// Row count per table, in creation order.
pub fn row_counts(conn: &Connection) -> Result<Vec<(&'static str, i64)>> {
    TABLES
        .iter()
        .map(|table| -> Result<(&'static str, i64)> {
            let count: i64 = conn.query_row(
                &format!("SELECT COUNT(*) FROM \"{}\"", table.name),
                [],
                |row| row.get(0),
            )?;
            Ok((table.name, count))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn
    }

    #[test]
    fn test_create_then_verify() {
        let conn = memory_conn();
        assert!(matches!(
            verify_schema(&conn),
            Err(EtlError::SchemaMissing { ref tables }) if tables.len() == TABLES.len()
        ));
        create_tables(&conn).unwrap();
        verify_schema(&conn).unwrap();
    }

    #[test]
    fn test_reset_is_idempotent_and_empties_tables() {
        let conn = memory_conn();
        reset(&conn).unwrap();
        conn.execute(
            "INSERT INTO artists (artist_id, name) VALUES ('A1', 'Artist')",
            [],
        )
        .unwrap();
        reset(&conn).unwrap();
        let counts = row_counts(&conn).unwrap();
        assert_eq!(counts.len(), 5);
        assert!(counts.iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn test_drop_tables_removes_everything() {
        let conn = memory_conn();
        create_tables(&conn).unwrap();
        drop_tables(&conn).unwrap();
        for table in TABLES {
            assert!(!table_exists(&conn, table.name).unwrap());
        }
    }

    #[test]
    fn test_song_requires_known_artist() {
        let conn = memory_conn();
        create_tables(&conn).unwrap();
        let err: EtlError = conn
            .execute(
                "INSERT INTO songs (song_id, title, artist_id, year, duration) VALUES ('S1', 'T', 'NOPE', 2000, 1.0)",
                [],
            )
            .unwrap_err()
            .into();
        assert_eq!(err.constraint_kind(), Some(crate::error::ConstraintKind::ForeignKey));
    }

    #[test]
    fn test_negative_year_rejected() {
        let conn = memory_conn();
        create_tables(&conn).unwrap();
        conn.execute("INSERT INTO artists (artist_id) VALUES ('A1')", [])
            .unwrap();
        let result = conn.execute(
            "INSERT INTO songs (song_id, artist_id, year) VALUES ('S1', 'A1', -5)",
            [],
        );
        assert!(result.is_err());
    }
}
