//! Directory walker: finds data files and feeds them to a loader, one
//! transaction per file.
//!
//! A failure stops the walk. Files committed before it stay loaded, the rest
//! are untouched, and the error reports how far the walk got.

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{EtlError, Result};
use crate::progress::{create_progress_bar, log_progress, ProgressMode};

#[derive(Clone, Debug)]
pub struct WalkOptions {
    /// Extension to match, without the dot; compared case-insensitively.
    pub extension: String,
    pub progress: ProgressMode,
    /// Label for the progress bar.
    pub label: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub found: usize,
    pub processed: usize,
}

/// All files under `root` with the given extension, sorted by path.
/// Symlinks are followed, so a linked file or directory counts as its target.
pub fn find_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let extension = extension.trim_start_matches('.').to_lowercase();
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = entry.map_err(|source| EtlError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let ext_ok = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase() == extension)
            .unwrap_or(false);
        if ext_ok {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Run `handler` on every matching file under `root`, committing after each.
pub fn process_data<F, T>(
    conn: &mut Connection,
    root: &Path,
    options: &WalkOptions,
    mut handler: F,
) -> Result<WalkSummary>
where
    F: FnMut(&Connection, &Path) -> Result<T>,
{
    let files = find_files(root, &options.extension)?;
    let total = files.len();
    info!("{} files found in {}", total, root.display());

    let pb = create_progress_bar(total as u64, &options.label, options.progress);
    let mut summary = WalkSummary {
        found: total,
        processed: 0,
    };

    for path in &files {
        let outcome = conn
            .transaction()
            .map_err(EtlError::from)
            .and_then(|tx| {
                handler(&*tx, path)?;
                tx.commit()?;
                Ok(())
            });

        if let Err(err) = outcome {
            pb.abandon();
            warn!(
                path = %path.display(),
                processed = summary.processed,
                total,
                "file failed, stopping: {}",
                err
            );
            return Err(EtlError::Aborted {
                path: path.clone(),
                processed: summary.processed,
                total,
                source: Box::new(err),
            });
        }

        summary.processed += 1;
        pb.inc(1);
        log_progress(options.progress, summary.processed as u64, total as u64);
    }

    pb.finish_with_message(format!("{}: {} files processed", options.label, summary.processed));
    Ok(summary)
}
