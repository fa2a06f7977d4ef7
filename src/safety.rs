//! Safety utilities to prevent accidental file deletion.
//!
//! `create-tables --recreate` deletes the database file before rebuilding
//! it. These checks make sure the path really is a database and not a piece
//! of the input data.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{EtlError, Result};

/// Extensions a SQLite database file is expected to carry.
pub const DATABASE_EXTENSIONS: &[&str] = &["db", "sqlite", "sqlite3"];

fn unsafe_path(path: &Path, reason: String) -> EtlError {
    EtlError::UnsafePath {
        path: path.to_path_buf(),
        reason,
    }
}

/// Validates that a database path is safe to delete.
///
/// Checks:
/// - the file name ends with one of [`DATABASE_EXTENSIONS`]
/// - the path is not a directory
/// - the path is not inside any of `data_roots`
pub fn validate_database_path(database: &Path, data_roots: &[&Path]) -> Result<()> {
    let ext = database
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if !DATABASE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(unsafe_path(
            database,
            format!("extension must be one of {:?}", DATABASE_EXTENSIONS),
        ));
    }

    if database.is_dir() {
        return Err(unsafe_path(database, "path is a directory".to_string()));
    }

    for root in data_roots {
        if database.starts_with(root) {
            return Err(unsafe_path(
                database,
                format!("path is inside data root '{}'", root.display()),
            ));
        }
    }

    Ok(())
}

/// The database file plus the `-wal` and `-shm` files SQLite keeps next to
/// it in WAL mode. A stale WAL left beside a fresh database gets replayed
/// into it, so they go together.
pub fn database_files(database: &Path) -> Vec<PathBuf> {
    let mut files = vec![database.to_path_buf()];
    for suffix in ["-wal", "-shm"] {
        let mut name = database.as_os_str().to_os_string();
        name.push(suffix);
        files.push(PathBuf::from(name));
    }
    files
}

/// Validate `database`, then delete it and its WAL sidecars.
/// Returns the paths that existed and were removed.
pub fn remove_database(database: &Path, data_roots: &[&Path]) -> Result<Vec<PathBuf>> {
    validate_database_path(database, data_roots)?;

    let mut removed = Vec::new();
    for file in database_files(database) {
        if !file.exists() {
            continue;
        }
        warn!("Removing {:?}", file);
        fs::remove_file(&file).map_err(|source| EtlError::Io {
            path: file.clone(),
            source,
        })?;
        removed.push(file);
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_valid_database_path() {
        let db = PathBuf::from("/tmp/sparkify.db");
        let songs = PathBuf::from("/data/song_data");
        assert!(validate_database_path(&db, &[&songs]).is_ok());
    }

    #[test]
    fn test_json_file_rejected() {
        let db = PathBuf::from("/data/song_data/A/TRAAAAW128F429D538.json");
        let err = validate_database_path(&db, &[]).unwrap_err();
        assert!(err.to_string().contains("extension must be one of"));
    }

    #[test]
    fn test_database_inside_data_root_rejected() {
        let db = PathBuf::from("/data/log_data/events.sqlite3");
        let logs = PathBuf::from("/data/log_data");
        let err = validate_database_path(&db, &[&logs]).unwrap_err();
        assert!(err.to_string().contains("inside data root"));
    }

    #[test]
    fn test_directory_rejected() {
        let dir = tempfile::Builder::new().suffix(".db").tempdir().unwrap();
        assert!(validate_database_path(dir.path(), &[]).is_err());
    }

    #[test]
    fn test_database_files_include_wal_sidecars() {
        let files = database_files(Path::new("/tmp/sparkify.db"));
        assert_eq!(
            files,
            vec![
                PathBuf::from("/tmp/sparkify.db"),
                PathBuf::from("/tmp/sparkify.db-wal"),
                PathBuf::from("/tmp/sparkify.db-shm"),
            ]
        );
    }

    #[test]
    fn test_remove_database_clears_stale_wal() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("sparkify.db");
        for file in database_files(&db) {
            std::fs::write(&file, b"stale").unwrap();
        }
        let keep = dir.path().join("notes.txt");
        std::fs::write(&keep, b"keep").unwrap();

        let removed = remove_database(&db, &[]).unwrap();

        assert_eq!(removed.len(), 3);
        assert!(database_files(&db).iter().all(|f| !f.exists()));
        assert!(keep.exists());
    }

    #[test]
    fn test_remove_database_refuses_unsafe_path() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("events.json");
        std::fs::write(&target, b"{}").unwrap();
        let wal = dir.path().join("events.json-wal");
        std::fs::write(&wal, b"").unwrap();

        assert!(remove_database(&target, &[]).is_err());
        assert!(target.exists());
        assert!(wal.exists());
    }
}
