//! Progress bar and logging utilities.
//!
//! Provides helpers for creating progress bars, with support for log-only
//! mode where bars are hidden and each step is logged for tail-friendly output.
//! The mode travels on [`crate::config::EtlConfig`] instead of a global flag.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;
use tracing::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProgressMode {
    /// Interactive progress bar on stderr.
    Bar,
    /// Hidden bar, one log line per processed file.
    LogOnly,
}

impl ProgressMode {
    pub fn from_log_only(log_only: bool) -> Self {
        if log_only {
            ProgressMode::LogOnly
        } else {
            ProgressMode::Bar
        }
    }

    pub fn is_log_only(self) -> bool {
        self == ProgressMode::LogOnly
    }
}

/// Format duration in human-readable format
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = secs / 60.0;
        format!("{:.1}m", mins)
    }
}

/// Create a progress bar with consistent styling.
/// In log-only mode, the progress bar is hidden.
pub fn create_progress_bar(len: u64, msg: &str, mode: ProgressMode) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if mode.is_log_only() {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        // Template is a literal; a parse failure falls back to the default style.
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({per_sec}, ETA: {eta})")
        {
            pb.set_style(style.progress_chars("=> "));
        }
    }
    pb.set_message(msg.to_string());
    pb
}

/// Log per-file progress. Only logs in log-only mode; the bar covers the rest.
pub fn log_progress(mode: ProgressMode, current: u64, total: u64) {
    if mode.is_log_only() {
        info!("{}/{} files processed.", current, total);
    }
}
