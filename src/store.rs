//! Store connection helpers.
//!
//! Every connection gets the same PRAGMAs. `foreign_keys = ON` matters most:
//! without it SQLite accepts songplays pointing at missing dimension rows.

use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

use crate::error::{EtlError, Result};

const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON;
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = NORMAL;
    PRAGMA busy_timeout = 5000;";

fn configure(conn: Connection, path: &Path) -> Result<Connection> {
    conn.execute_batch(CONNECTION_PRAGMAS)
        .map_err(|source| EtlError::Connect {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(conn)
}

/// Open (creating if needed) the database at `path`.
pub fn open(path: &Path) -> Result<Connection> {
    debug!(path = %path.display(), "opening store");
    let conn = Connection::open(path).map_err(|source| EtlError::Connect {
        path: path.to_path_buf(),
        source,
    })?;
    configure(conn, path)
}

/// Open an existing database; a missing file is a connection error rather
/// than a fresh empty store.
pub fn open_existing(path: &Path) -> Result<Connection> {
    use rusqlite::OpenFlags;

    debug!(path = %path.display(), "opening existing store");
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    let conn = Connection::open_with_flags(path, flags).map_err(|source| EtlError::Connect {
        path: path.to_path_buf(),
        source,
    })?;
    configure(conn, path)
}

pub fn open_in_memory() -> Result<Connection> {
    let path = Path::new(":memory:");
    let conn = Connection::open_in_memory().map_err(|source| EtlError::Connect {
        path: path.to_path_buf(),
        source,
    })?;
    configure(conn, path)
}
