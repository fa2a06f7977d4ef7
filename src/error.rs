//! Error taxonomy for the ETL library.
//!
//! Binaries wrap these in `anyhow` with context; library code returns
//! [`EtlError`] so callers (and tests) can tell a malformed file from a
//! constraint violation from a store that cannot be reached.

use rusqlite::ffi;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EtlError>;

/// Which integrity rule the store rejected a row for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    DuplicateKey,
    ForeignKey,
    Check,
    NotNull,
    Other,
}

impl ConstraintKind {
    fn from_extended_code(code: i32) -> Self {
        match code {
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                ConstraintKind::DuplicateKey
            }
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => ConstraintKind::ForeignKey,
            ffi::SQLITE_CONSTRAINT_CHECK => ConstraintKind::Check,
            ffi::SQLITE_CONSTRAINT_NOTNULL => ConstraintKind::NotNull,
            _ => ConstraintKind::Other,
        }
    }
}

#[derive(Debug, Error)]
pub enum EtlError {
    /// The store could not be opened; fatal for the whole run.
    #[error("failed to connect to store at {path}")]
    Connect {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content does not parse as the expected record shape.
    #[error("malformed record in {path} at line {line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("constraint violation ({kind:?})")]
    Constraint {
        kind: ConstraintKind,
        #[source]
        source: rusqlite::Error,
    },

    #[error("store operation failed")]
    Store(#[source] rusqlite::Error),

    #[error("timestamp {ts} ms is outside the representable calendar range")]
    InvalidTimestamp { ts: i64 },

    #[error("failed to enumerate files under {root}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A per-file handler failed; `processed` files were committed before it.
    #[error("processing {path} failed after {processed}/{total} files processed")]
    Aborted {
        path: PathBuf,
        processed: usize,
        total: usize,
        #[source]
        source: Box<EtlError>,
    },

    #[error("missing tables {tables:?}, run create-tables first")]
    SchemaMissing { tables: Vec<&'static str> },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("refusing to delete {path}: {reason}")]
    UnsafePath { path: PathBuf, reason: String },
}

impl EtlError {
    /// Returns the constraint kind when this error (or the error wrapped by
    /// an [`EtlError::Aborted`]) is a constraint violation.
    pub fn constraint_kind(&self) -> Option<ConstraintKind> {
        match self {
            EtlError::Constraint { kind, .. } => Some(*kind),
            EtlError::Aborted { source, .. } => source.constraint_kind(),
            _ => None,
        }
    }

    pub fn is_duplicate_key(&self) -> bool {
        self.constraint_kind() == Some(ConstraintKind::DuplicateKey)
    }
}

impl From<rusqlite::Error> for EtlError {
    fn from(err: rusqlite::Error) -> Self {
        let kind = match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Some(ConstraintKind::from_extended_code(e.extended_code))
            }
            _ => None,
        };
        match kind {
            Some(kind) => EtlError::Constraint { kind, source: err },
            None => EtlError::Store(err),
        }
    }
}
