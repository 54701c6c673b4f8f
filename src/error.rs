use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{} has no header row", .path.display())]
    EmptyHeader { path: PathBuf },
}

/// Failures local to a single view. They are rendered next to the view that
/// produced them and never abort the session.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InsightError {
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("computation failed: {0}")]
    Computation(String),

    #[error("column not present in dataset: {0}")]
    MissingColumn(String),

    #[error("invalid selection: {0}")]
    InvalidSelection(String),
}
