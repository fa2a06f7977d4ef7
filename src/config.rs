//! Run configuration.
//!
//! Built once by a binary from its CLI arguments and handed by reference to
//! every component that needs it. Nothing reads configuration ambiently.

use std::path::PathBuf;

use crate::error::{EtlError, Result};
use crate::progress::ProgressMode;

pub const DEFAULT_DATABASE: &str = "sparkify.db";
pub const DEFAULT_SONG_DATA: &str = "data/song_data";
pub const DEFAULT_LOG_DATA: &str = "data/log_data";
pub const DEFAULT_EXTENSION: &str = "json";

#[derive(Clone, Debug)]
pub struct EtlConfig {
    /// SQLite database file (or `:memory:`).
    pub database: PathBuf,
    /// Root of the song-metadata files.
    pub song_data: PathBuf,
    /// Root of the activity-log files.
    pub log_data: PathBuf,
    /// File extension (without the dot) that marks a data file.
    pub extension: String,
    pub progress: ProgressMode,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            song_data: PathBuf::from(DEFAULT_SONG_DATA),
            log_data: PathBuf::from(DEFAULT_LOG_DATA),
            extension: DEFAULT_EXTENSION.to_string(),
            progress: ProgressMode::Bar,
        }
    }
}

impl EtlConfig {
    pub fn validate(&self) -> Result<()> {
        let ext = self.extension.trim_start_matches('.');
        if ext.is_empty() {
            return Err(EtlError::Config("file extension cannot be empty".into()));
        }
        for (label, root) in [("song data", &self.song_data), ("log data", &self.log_data)] {
            if !root.is_dir() {
                return Err(EtlError::Config(format!(
                    "{} root '{}' is not a directory",
                    label,
                    root.display()
                )));
            }
        }
        Ok(())
    }

    /// Extension normalized for comparison: no leading dot, lowercase.
    pub fn normalized_extension(&self) -> String {
        self.extension.trim_start_matches('.').to_lowercase()
    }
}
