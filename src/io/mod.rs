//! Reading record tables and candidate limits from disk
//!
//! The binary test-data parser is an external collaborator; its output is
//! exchanged as one directory per file holding `dies.csv`,
//! `measurements.csv`, `tests.csv` and an optional `header.yaml`.

pub mod limits;
pub mod lot_dir;

use std::path::PathBuf;

use thiserror::Error;

pub use limits::read_limits;
pub use lot_dir::{read_lot_dir, read_lots};

/// Errors reading input files
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid YAML in {path}: {message}")]
    Yaml { path: PathBuf, message: String },

    #[error("Missing {file} in {dir}")]
    MissingFile { dir: PathBuf, file: &'static str },
}
