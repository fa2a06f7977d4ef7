//! Sparkify ETL library - shared modules for the loader and admin binaries.

pub mod calendar;
pub mod config;
pub mod error;
pub mod log_transformer;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod resolver;
pub mod safety;
pub mod schema;
pub mod song_loader;
pub mod store;
pub mod walker;
