//! Full run: song files first (they fill the catalog the resolver reads),
//! then activity logs.

use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::info;

use crate::config::EtlConfig;
use crate::error::Result;
use crate::log_transformer::{self, LogFileStats};
use crate::schema;
use crate::song_loader;
use crate::walker::{self, WalkOptions, WalkSummary};

#[derive(Clone, Debug)]
pub struct RunSummary {
    pub songs: WalkSummary,
    pub logs: WalkSummary,
    pub song_plays: usize,
    pub resolved: usize,
    pub row_counts: Vec<(&'static str, i64)>,
    pub elapsed: Duration,
}

pub struct Pipeline<'a> {
    config: &'a EtlConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a EtlConfig) -> Self {
        Self { config }
    }

    fn walk_options(&self, label: &str) -> WalkOptions {
        WalkOptions {
            extension: self.config.normalized_extension(),
            progress: self.config.progress,
            label: label.to_string(),
        }
    }

    pub fn load_songs(&self, conn: &mut Connection) -> Result<WalkSummary> {
        walker::process_data(
            conn,
            &self.config.song_data,
            &self.walk_options("Song files"),
            song_loader::process_song_file,
        )
    }

    /// Returns the walk summary plus the summed per-file log stats.
    pub fn load_logs(&self, conn: &mut Connection) -> Result<(WalkSummary, LogFileStats)> {
        let mut totals = LogFileStats::default();
        let summary = walker::process_data(
            conn,
            &self.config.log_data,
            &self.walk_options("Log files"),
            |tx: &Connection, path: &Path| {
                let stats = log_transformer::process_log_file(tx, path)?;
                totals.events += stats.events;
                totals.song_plays += stats.song_plays;
                totals.new_time_rows += stats.new_time_rows;
                totals.new_users += stats.new_users;
                totals.resolved += stats.resolved;
                Ok(())
            },
        )?;
        Ok((summary, totals))
    }

    pub fn run(&self, conn: &mut Connection) -> Result<RunSummary> {
        let start = Instant::now();
        schema::verify_schema(conn)?;

        info!(root = %self.config.song_data.display(), "loading song data");
        let songs = self.load_songs(conn)?;

        info!(root = %self.config.log_data.display(), "loading log data");
        let (logs, totals) = self.load_logs(conn)?;

        Ok(RunSummary {
            songs,
            logs,
            song_plays: totals.song_plays,
            resolved: totals.resolved,
            row_counts: schema::row_counts(conn)?,
            elapsed: start.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use crate::progress::ProgressMode;
    use crate::store;

    #[test]
    fn test_run_requires_schema() {
        let dir = tempfile::tempdir().unwrap();
        let config = EtlConfig {
            database: dir.path().join("db.sqlite"),
            song_data: dir.path().to_path_buf(),
            log_data: dir.path().to_path_buf(),
            progress: ProgressMode::LogOnly,
            ..EtlConfig::default()
        };
        let mut conn = store::open_in_memory().unwrap();
        let err = Pipeline::new(&config).run(&mut conn).unwrap_err();
        assert!(matches!(err, EtlError::SchemaMissing { .. }));
    }

    #[test]
    fn test_run_over_empty_roots() {
        let dir = tempfile::tempdir().unwrap();
        let config = EtlConfig {
            song_data: dir.path().to_path_buf(),
            log_data: dir.path().to_path_buf(),
            progress: ProgressMode::LogOnly,
            ..EtlConfig::default()
        };
        let mut conn = store::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        let summary = Pipeline::new(&config).run(&mut conn).unwrap();
        assert_eq!(summary.songs.found, 0);
        assert_eq!(summary.logs.found, 0);
        assert_eq!(summary.song_plays, 0);
        assert!(summary.row_counts.iter().all(|(_, n)| *n == 0));
    }
}
